use std::{
    fs,
    path::{Path, PathBuf},
};

/// Writes `content` to `dir/name` and marks it executable.
pub fn create_executable(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(perms.mode() | 0o111);
        fs::set_permissions(&path, perms).unwrap();
    }
    path
}

/// A stand-in for the jh61b harness launcher. It records every invocation next to itself
/// (`calls.log` gets the target class, `args.txt` the full argument list of the last call),
/// exposes `$out` and `$target` to `body`, then runs `body`.
pub fn create_fake_harness(dir: &Path, body: &str) -> PathBuf {
    let script = format!(
        r#"#!/bin/sh
here="$(dirname "$0")"
out=""
target=""
prev=""
pprev=""
for arg in "$@"; do
  if [ "$prev" = "--outfile" ]; then out="$arg"; fi
  if [ "$pprev" = "-classpath" ]; then target="$arg"; fi
  pprev="$prev"
  prev="$arg"
done
echo "$target" >> "$here/calls.log"
printf '%s\n' "$@" > "$here/args.txt"
{body}
"#
    );
    create_executable(dir, "harness.sh", &script)
}

/// Harness body writing a results document with one test per `(name, score, max_score)`.
pub fn harness_writing(tests: &[(&str, f64, f64)]) -> String {
    let tests = tests
        .iter()
        .map(|(name, score, max)| {
            format!(r#"{{"name": "{name}", "score": {score}, "max_score": {max}, "status": "passed"}}"#)
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("cat > \"$out\" <<'EOF'\n{{\"tests\": [{tests}]}}\nEOF")
}
