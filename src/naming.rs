//! File naming for batch runs.
//!
//! Two small pieces of string logic, kept here so the batch driver stays
//! about scheduling:
//!
//! - [`matches_pattern`]: shell-style matching of a file *name* against a
//!   pattern such as `*.png` or `frame-??.tif`. `*` matches any run of
//!   characters (including none), `?` matches exactly one, everything else
//!   matches itself. Matching is case-sensitive and never crosses directories
//!   because only bare names are matched.
//! - [`output_file_name`]: the output name for a source path, its stem plus
//!   the target extension. `img/photo.png` + `jpg` → `photo.jpg`.

use std::path::Path;

/// Whether `name` matches the shell-style `pattern`.
///
/// - `"*.png"` matches `"a.png"`, `".png"`, not `"a.PNG"`
/// - `"img-?.jpg"` matches `"img-1.jpg"`, not `"img-10.jpg"`
/// - `"*"` matches everything
pub fn matches_pattern(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();

    // Greedy match with single-star backtracking.
    let (mut pi, mut ni) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while ni < n.len() {
        match p.get(pi) {
            Some('*') => {
                star = Some((pi, ni));
                pi += 1;
            }
            Some(&c) if c == '?' || c == n[ni] => {
                pi += 1;
                ni += 1;
            }
            _ => match star {
                Some((sp, sn)) => {
                    pi = sp + 1;
                    ni = sn + 1;
                    star = Some((sp, sn + 1));
                }
                None => return false,
            },
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

/// Output file name for `source`: its stem with `extension` appended.
///
/// Returns `None` when the source has no usable stem.
pub fn output_file_name(source: &Path, extension: &str) -> Option<String> {
    let stem = source.file_stem()?.to_str()?;
    let extension = extension.trim_start_matches('.');
    Some(format!("{stem}.{extension}"))
}
