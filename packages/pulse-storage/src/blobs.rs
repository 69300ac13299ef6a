use std::path::{Component, Path, PathBuf};

use tokio::fs;

use crate::{Error, Result};

/// Object store rooted at a bucket directory. Keys are relative slash-separated paths.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
	root: PathBuf,
}
impl FsBlobStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
		let path = self.path_for(key)?;

		match fs::read(&path).await {
			Ok(bytes) => Ok(Some(bytes)),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(err) => Err(err.into()),
		}
	}

	/// Writes the object atomically, replacing any previous version.
	pub async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
		let path = self.path_for(key)?;

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).await?;
		}

		let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4().simple()));

		fs::write(&tmp, bytes).await?;

		if let Err(err) = fs::rename(&tmp, &path).await {
			let _ = fs::remove_file(&tmp).await;

			return Err(err.into());
		}

		tracing::debug!(key, bytes = bytes.len(), "Blob written.");

		Ok(())
	}

	fn path_for(&self, key: &str) -> Result<PathBuf> {
		validate_key(key)?;

		Ok(self.root.join(key))
	}
}

fn validate_key(key: &str) -> Result<()> {
	if key.trim().is_empty() {
		return Err(Error::InvalidArgument("Blob key must not be empty.".to_string()));
	}

	for component in Path::new(key).components() {
		match component {
			Component::Normal(_) => {},
			_ => {
				return Err(Error::InvalidArgument(format!(
					"Blob key {key:?} must be a relative path without '..' segments."
				)));
			},
		}
	}

	Ok(())
}
