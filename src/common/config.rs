// Copyright 2019 Guillaume Becquin
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::common::error::FinetuneError;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;

/// # Utility to deserialize JSON config files
pub trait Config
where
    for<'de> Self: Deserialize<'de>,
{
    /// Loads a `Config` object from a JSON file. The format is expected to be aligned with the
    /// field names of the implementing struct; missing optional fields fall back to their serde default.
    ///
    /// # Arguments
    ///
    /// * `path` - `Path` to the configuration JSON file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bert_finetune::finetune::FinetuneConfig;
    /// use bert_finetune::Config;
    /// use std::path::Path;
    ///
    /// let config_path = Path::new("path/to/finetune_config.json");
    /// let config = FinetuneConfig::from_file(config_path);
    /// ```
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FinetuneError> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|error| match error.kind() {
            ErrorKind::NotFound => FinetuneError::FileNotFound(path.display().to_string()),
            _ => FinetuneError::IOError(format!("{}: {}", path.display(), error)),
        })?;
        let br = BufReader::new(f);
        let config: Self = serde_json::from_reader(br)?;
        Ok(config)
    }
}
