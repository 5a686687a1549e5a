//! Shared helpers for CLI tests.

use std::fs;
use std::path::{Path, PathBuf};

/// Path to the compiled binary.
pub fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_doxybib"))
}

/// A `.bbl` as the doxybib BibTeX style would write it.
pub const SAMPLE_BBL: &str = "- \\anchor Bueler2009 E.~Bueler and J.~Brown, \
\\href{http://dx.doi.org/10.1029/2008JF001179}{doi}, 2009--2010.\n";

/// HTML expected from [`SAMPLE_BBL`].
pub const SAMPLE_HTML: &str = "- \\anchor Bueler2009 E.&nbsp;Bueler and J.&nbsp;Brown, \
<a href=\"http://dx.doi.org/10.1029/2008JF001179\">doi</a>, 2009&ndash;2010.\n";

/// Writes an executable shell script into `dir` and returns its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A fake LaTeX that records the document it was given.
#[cfg(unix)]
pub fn fake_compiler(dir: &Path) -> PathBuf {
    write_script(dir, "fake-latex", "cat > received.tex")
}

/// A fake BibTeX that writes [`SAMPLE_BBL`] as `<job>.bbl`.
#[cfg(unix)]
pub fn fake_formatter(dir: &Path) -> PathBuf {
    fs::write(dir.join("sample.bbl.in"), SAMPLE_BBL).unwrap();
    write_script(dir, "fake-bibtex", "cp sample.bbl.in \"$1.bbl\"")
}
