use crate::common::error::FinetuneError;
use crate::resources::ResourceProvider;
use std::path::PathBuf;

/// # Local resource
#[derive(PartialEq, Clone, Debug)]
pub struct LocalResource {
    /// Local path for the resource
    pub local_path: PathBuf,
}

impl ResourceProvider for LocalResource {
    /// Gets the path for a local resource. Fails with `FileNotFound` if nothing exists at that path.
    ///
    /// # Returns
    ///
    /// * `PathBuf` pointing to the resource file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bert_finetune::resources::{LocalResource, ResourceProvider};
    /// use std::path::PathBuf;
    /// let vocab_resource = LocalResource {
    ///     local_path: PathBuf::from("path/to/vocab.txt"),
    /// };
    /// let vocab_path = vocab_resource.get_local_path();
    /// ```
    fn get_local_path(&self) -> Result<PathBuf, FinetuneError> {
        if !self.local_path.exists() {
            return Err(FinetuneError::FileNotFound(
                self.local_path.display().to_string(),
            ));
        }
        Ok(self.local_path.clone())
    }
}

impl From<PathBuf> for LocalResource {
    fn from(local_path: PathBuf) -> Self {
        Self { local_path }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_local_resource_is_reported() {
        let resource = LocalResource::from(PathBuf::from("does/not/exist/vocab.txt"));
        let error = resource.get_local_path().unwrap_err();
        assert!(matches!(error, FinetuneError::FileNotFound(_)));
    }

    #[test]
    fn existing_local_resource_resolves() -> anyhow::Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        let resource = LocalResource::from(file.path().to_path_buf());
        assert_eq!(resource.get_local_path()?, file.path());
        Ok(())
    }
}
