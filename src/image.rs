//! Program images.
//!
//! An image is plain text with one byte per line written as a binary literal,
//! for example:
//!
//! ```text
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 00000001 # HLT
//! ```
//!
//! Everything after `#` is a comment. Only lines starting with `0` or `1` are
//! significant, and only their first 8 characters are read.

use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::span::{Idx, Span};

/// Characters of a line which make up its byte.
const LITERAL_WIDTH: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadError {
    NotFound {
        path: PathBuf,
    },
    Io {
        path: PathBuf,
        kind: io::ErrorKind,
    },
    /// Significant line which is not an 8-bit binary literal.
    Malformed {
        /// 1-indexed
        line: usize,
        text: String,
        span: Span,
    },
    TooLarge {
        len: usize,
    },
}

impl error::Error for LoadError {}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "{} not found", path.display()),
            Self::Io { path, kind } => write!(f, "Failed to read {}: {kind}", path.display()),
            Self::Malformed { line, text, span } => write!(
                f,
                "Malformed instruction on line {line}: `{}`",
                &text[span.as_range()]
            ),
            Self::TooLarge { len } => write!(
                f,
                "Program is {len} bytes long and cannot fit in {} bytes of memory",
                crate::memory::MEMORY_SIZE
            ),
        }
    }
}

/// Read and parse the image at `path`.
pub fn read(path: &Path) -> Result<Vec<u8>, LoadError> {
    let src = fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        kind => LoadError::Io {
            path: path.to_path_buf(),
            kind,
        },
    })?;
    parse(&src)
}

/// Parse image text into bytes, in load order.
pub fn parse(src: &str) -> Result<Vec<u8>, LoadError> {
    let mut bytes = Vec::new();
    for (i, line) in src.lines().enumerate() {
        let payload = line.split_once('#').map_or(line, |(payload, _)| payload);
        if !payload.starts_with(['0', '1']) {
            continue;
        }
        let end = payload
            .char_indices()
            .nth(LITERAL_WIDTH)
            .map_or(payload.len(), |(idx, _)| idx);
        let literal = payload[..end].trim_end();
        let byte = u8::from_str_radix(literal, 2).map_err(|_| LoadError::Malformed {
            line: i + 1,
            text: line.to_owned(),
            span: Span::new(Idx(0), literal.len() as u16),
        })?;
        bytes.push(byte);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literals_and_skips_comments() {
        let src = "\
# print8.ls8: Print the number 8 on the screen

10000010 # LDI R0,8
00000000
00001000
01000111 # PRN R0
00000000
00000001 # HLT
";
        assert_eq!(
            parse(src),
            Ok(vec![0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001])
        );
    }

    #[test]
    fn only_leading_binary_digit_is_significant() {
        let src = "LDI R0, 8\n  10000010\n\t00000001\nx\n00000001\n";
        assert_eq!(parse(src), Ok(vec![1]));
    }

    #[test]
    fn reads_first_eight_characters() {
        assert_eq!(parse("000000011111"), Ok(vec![1]));
        assert_eq!(parse("10100010extra"), Ok(vec![0b1010_0010]));
        assert_eq!(parse("00000001   \r\n"), Ok(vec![1]));
    }

    #[test]
    fn short_literals_are_accepted() {
        assert_eq!(parse("101 # five"), Ok(vec![5]));
        assert_eq!(parse("0"), Ok(vec![0]));
    }

    #[test]
    fn comment_only_image_is_empty() {
        assert_eq!(parse("# nothing\n\n   \n#00000001\n"), Ok(vec![]));
        assert_eq!(parse(""), Ok(vec![]));
    }

    #[test]
    fn malformed_literal() {
        let src = "00000001\n10 01\n";
        assert_eq!(
            parse(src),
            Err(LoadError::Malformed {
                line: 2,
                text: "10 01".to_owned(),
                span: Span::new(Idx(0), 5),
            })
        );
        assert!(matches!(
            parse("0000001x"),
            Err(LoadError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn malformed_message_shows_literal() {
        let err = parse("1002 # oops").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed instruction on line 1: `1002`"
        );
    }

    #[test]
    fn missing_file() {
        let path = Path::new("this/image/does/not/exist.ls8");
        assert_eq!(
            read(path),
            Err(LoadError::NotFound {
                path: path.to_path_buf()
            })
        );
    }

    #[test]
    fn reads_generated_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# generated").unwrap();
        writeln!(file, "01000111").unwrap();
        writeln!(file, "00000011 # R3").unwrap();
        assert_eq!(read(file.path()), Ok(vec![0b0100_0111, 3]));
    }
}
