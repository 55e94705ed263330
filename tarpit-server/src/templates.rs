use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use tarpit_core::io::{dir_size, list_files};
use tarpit_core::macros::{Template, TemplateError};

const TEMPLATE_EXTENSION: &str = "html";

#[derive(Error, Debug)]
pub enum StoreError {
	#[error("IO error: {0}")]
	Io(#[from] io::Error),
	#[error("Invalid template name: {0:?}")]
	InvalidName(String),
	#[error("Template not found: {0}")]
	NotFound(String),
	#[error(transparent)]
	Template(#[from] TemplateError),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplatesInfo {
	pub file_names: Vec<String>,
	pub count: usize,
	pub total_disk_usage: u64,
}

/// Compiled templates mirrored from a directory of `.html` files.
///
/// Templates are compiled when loaded or uploaded, so a file that does not
/// parse is never written to disk nor served.
pub struct TemplateStore {
	dir: PathBuf,
	templates: RwLock<HashMap<String, Arc<Template>>>,
}

/// Accepts plain `.html` file names only.
pub fn validate_name(name: &str) -> Result<(), StoreError> {
	let has_extension = Path::new(name)
		.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| ext.eq_ignore_ascii_case(TEMPLATE_EXTENSION));
	let traversal = name.contains('/') || name.contains('\\') || name.contains("..");
	if !has_extension || traversal || name.starts_with('.') {
		return Err(StoreError::InvalidName(name.to_owned()));
	}
	Ok(())
}

impl TemplateStore {
	/// Compiles every template in `dir`, creating the directory if needed.
	///
	/// A template that fails to compile is skipped with a warning.
	pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
		let dir = dir.as_ref().to_path_buf();
		fs::create_dir_all(&dir)?;

		let mut templates = HashMap::new();
		for name in list_files(&dir, TEMPLATE_EXTENSION)? {
			let source = fs::read_to_string(dir.join(&name))?;
			match Template::compile(&name, &source) {
				Ok(template) => {
					templates.insert(name, Arc::new(template));
				}
				Err(e) => log::warn!("Skipping template {name}: {e}"),
			}
		}
		log::info!("Loaded {} template(s) from {}", templates.len(), dir.display());

		Ok(Self { dir, templates: RwLock::new(templates) })
	}

	pub fn len(&self) -> usize {
		self.templates.read().map(|t| t.len()).unwrap_or_default()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// A uniformly chosen template, or `None` when the store is empty.
	pub fn pick(&self, rng: &mut impl Rng) -> Option<Arc<Template>> {
		let templates = self.templates.read().ok()?;
		if templates.is_empty() {
			return None;
		}
		let mut names: Vec<&String> = templates.keys().collect();
		names.sort();
		let name = names[rng.random_range(0..names.len())];
		templates.get(name).cloned()
	}

	/// Compiles `source` and, if it parses, writes it to disk and serves it.
	pub fn save(&self, name: &str, source: &str) -> Result<(), StoreError> {
		validate_name(name)?;
		let template = Template::compile(name, source)?;
		fs::write(self.dir.join(name), source)?;
		let mut templates = self.templates.write().unwrap_or_else(|poisoned| poisoned.into_inner());
		templates.insert(name.to_owned(), Arc::new(template));
		log::info!("Saved template {name}");
		Ok(())
	}

	pub fn delete(&self, name: &str) -> Result<(), StoreError> {
		validate_name(name)?;
		let path = self.dir.join(name);
		if !path.is_file() {
			return Err(StoreError::NotFound(name.to_owned()));
		}
		fs::remove_file(&path)?;
		let mut templates = self.templates.write().unwrap_or_else(|poisoned| poisoned.into_inner());
		templates.remove(name);
		log::info!("Deleted template {name}");
		Ok(())
	}

	/// Describes the directory as it is on disk, including files that failed to compile.
	pub fn info(&self) -> Result<TemplatesInfo, StoreError> {
		let file_names = list_files(&self.dir, TEMPLATE_EXTENSION)?;
		Ok(TemplatesInfo {
			count: file_names.len(),
			file_names,
			total_disk_usage: dir_size(&self.dir)?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn names_are_validated() {
		assert!(validate_name("page.html").is_ok());
		assert!(validate_name("Page.HTML").is_ok());
		for bad in ["page.txt", "../page.html", "a/b.html", "a\\b.html", ".html", "page"] {
			assert!(matches!(validate_name(bad), Err(StoreError::InvalidName(_))), "{bad}");
		}
	}

	#[test]
	fn load_skips_broken_templates() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("good.html"), "<p>{{ randomInt 1 2 }}</p>").unwrap();
		fs::write(dir.path().join("broken.html"), "{{ range 3 }}").unwrap();
		fs::write(dir.path().join("readme.txt"), "ignored").unwrap();

		let store = TemplateStore::load(dir.path()).unwrap();
		assert_eq!(store.len(), 1);

		let info = store.info().unwrap();
		assert_eq!(info.count, 2);
		assert_eq!(info.file_names, vec!["broken.html".to_owned(), "good.html".to_owned()]);
	}

	#[test]
	fn save_pick_delete() {
		let dir = tempfile::tempdir().unwrap();
		let store = TemplateStore::load(dir.path().join("templates")).unwrap();
		let mut rng = StdRng::seed_from_u64(1);
		assert!(store.is_empty());
		assert!(store.pick(&mut rng).is_none());

		store.save("one.html", "<p>one</p>").unwrap();
		assert_eq!(store.pick(&mut rng).unwrap().name(), "one.html");
		assert!(dir.path().join("templates/one.html").is_file());

		store.delete("one.html").unwrap();
		assert!(store.is_empty());
		assert!(matches!(store.delete("one.html"), Err(StoreError::NotFound(_))));
	}

	#[test]
	fn save_rejects_invalid_template() {
		let dir = tempfile::tempdir().unwrap();
		let store = TemplateStore::load(dir.path()).unwrap();
		let err = store.save("bad.html", "{{ noSuchMacro }}").unwrap_err();
		assert!(matches!(err, StoreError::Template(_)));
		assert!(!dir.path().join("bad.html").exists());
	}
}
