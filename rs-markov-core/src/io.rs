use std::path::{Component, Path, PathBuf};
use std::{env, fs, io};

/// Reads a text file and returns its non-empty, trimmed lines.
///
/// - Invalid UTF-8 sequences are replaced, not rejected
/// - Splits on `\n` / `\r\n`
pub fn read_lines<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let bytes = fs::read(filename)?;
	let contents = String::from_utf8_lossy(&bytes);
	Ok(contents
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.map(str::to_owned)
		.collect())
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/input.txt` + `"bin"` → `data/input.bin`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/tolstoy.txt"` → `"tolstoy"`
/// - `"tolstoy.txt"` → `"tolstoy"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// `true` if `name` can be joined to a folder without leaving it.
///
/// Only a single normal path component is accepted: no separators,
/// no `.` or `..`, not empty.
pub fn is_plain_name(name: &str) -> bool {
	let mut components = Path::new(name).components();
	let single = matches!(
		(components.next(), components.next()),
		(Some(Component::Normal(part)), None) if part == name
	);
	single && !name.contains(['/', '\\'])
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Home directory of the current user, or the working directory if unknown.
pub fn home_folder() -> PathBuf {
	env::var_os("HOME")
		.or_else(|| env::var_os("USERPROFILE"))
		.map(PathBuf::from)
		.unwrap_or_else(|| normalize_folder("."))
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

/// Writes `bytes` to `target` through a sibling `.backup` file.
///
/// The data is first written to `<stem>.backup`, then copied over `target`,
/// then the backup is removed. A crash mid-write leaves the previous
/// `target` intact. The parent folder is created if missing.
pub fn write_with_backup<P: AsRef<Path>>(target: P, bytes: &[u8]) -> io::Result<()> {
	let target = target.as_ref();
	if let Some(parent) = target.parent() {
		if !parent.as_os_str().is_empty() {
			fs::create_dir_all(parent)?;
		}
	}

	let backup = build_output_path(target, "backup")?;
	fs::write(&backup, bytes)?;
	fs::copy(&backup, target)?;
	fs::remove_file(&backup)?;
	Ok(())
}
