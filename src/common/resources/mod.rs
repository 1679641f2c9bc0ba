//! # Resource definitions for tokenizer vocabularies and configuration files
//!
//! The fine-tuning pipeline relies on the concept of Resources to access the files it needs
//! besides the dataset itself:
//! - tokenizer vocabularies (e.g. `vocab.txt` for BERT)
//! - fine-tuning configuration files
//!
//! Two types of resources are pre-defined:
//! - LocalResource: points to a local file
//! - RemoteResource: points to a remote file via a URL (requires the `remote` feature)
//!
//! For both types of resources, the local location of the file can be retrieved using
//! `get_local_path`, allowing to reference the resource file location regardless if it is a remote
//! or local resource. Pretrained vocabularies are listed in `pipelines::common::BertVocabResources`.

mod local;

use crate::common::error::FinetuneError;
pub use local::LocalResource;
use std::path::PathBuf;

/// # Resource Trait that can provide the location of a vocabulary or configuration resource
pub trait ResourceProvider {
    /// Provides the local path for a resource.
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
    fn get_local_path(&self) -> Result<PathBuf, FinetuneError>;
}

impl<T: ResourceProvider + ?Sized> ResourceProvider for Box<T> {
    fn get_local_path(&self) -> Result<PathBuf, FinetuneError> {
        T::get_local_path(self)
    }
}

#[cfg(feature = "remote")]
mod remote;
#[cfg(feature = "remote")]
pub use remote::RemoteResource;
