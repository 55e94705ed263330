use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::{fs, io};

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted so callers see a stable order.
/// The extension comparison is case-insensitive (`page.HTML` matches `html`).
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();

		if !path.is_file() {
			continue;
		}
		let matches = path
			.extension()
			.and_then(|ext| ext.to_str())
			.is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
		if matches {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

/// Sums the size in bytes of every regular file directly inside `dir`.
pub fn dir_size<P: AsRef<Path>>(dir: P) -> io::Result<u64> {
	let mut size = 0;
	for entry in fs::read_dir(dir)? {
		let metadata = entry?.metadata()?;
		if metadata.is_file() {
			size += metadata.len();
		}
	}
	Ok(size)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn list_files_filters_by_extension() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("b.html"), "b").unwrap();
		fs::write(dir.path().join("a.HTML"), "a").unwrap();
		fs::write(dir.path().join("notes.txt"), "x").unwrap();
		fs::create_dir(dir.path().join("nested.html")).unwrap();

		let files = list_files(dir.path(), "html").unwrap();
		assert_eq!(files, vec!["a.HTML".to_owned(), "b.html".to_owned()]);
		assert_eq!(dir_size(dir.path()).unwrap(), 3);
	}
}
