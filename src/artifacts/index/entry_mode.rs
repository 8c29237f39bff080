//! File modes recorded in the index and in tree entries

#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd, Hash)]
pub enum FileMode {
    #[default]
    Regular,
    Executable,
    Symlink,
}

#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd, Hash)]
pub enum EntryMode {
    File(FileMode),
    #[default]
    Directory,
}

impl EntryMode {
    pub fn as_str(&self) -> &str {
        match self {
            EntryMode::File(FileMode::Regular) => "100644",
            EntryMode::File(FileMode::Executable) => "100755",
            EntryMode::File(FileMode::Symlink) => "120000",
            EntryMode::Directory => "40000",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::File(FileMode::Regular) => 0o100644,
            EntryMode::File(FileMode::Executable) => 0o100755,
            EntryMode::File(FileMode::Symlink) => 0o120000,
            EntryMode::Directory => 0o40000,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }

    /// Parse the octal form used in tree objects (`100644`, `40000`, ...)
    pub fn from_octal_str(value: &str) -> anyhow::Result<Self> {
        let mode = u32::from_str_radix(value, 8)
            .map_err(|_| anyhow::anyhow!("Invalid entry mode: {value}"))?;
        EntryMode::try_from(mode)
    }
}

impl TryFrom<u32> for EntryMode {
    type Error = anyhow::Error;

    fn try_from(mode: u32) -> anyhow::Result<Self> {
        // collapse arbitrary permission bits the way git does
        match mode & 0o170000 {
            0o100000 if mode & 0o100 != 0 => Ok(EntryMode::File(FileMode::Executable)),
            0o100000 => Ok(EntryMode::File(FileMode::Regular)),
            0o120000 => Ok(EntryMode::File(FileMode::Symlink)),
            0o040000 => Ok(EntryMode::Directory),
            _ => Err(anyhow::anyhow!("Invalid entry mode: {mode:o}")),
        }
    }
}

impl From<FileMode> for EntryMode {
    fn from(mode: FileMode) -> Self {
        EntryMode::File(mode)
    }
}

impl TryFrom<EntryMode> for FileMode {
    type Error = anyhow::Error;

    fn try_from(value: EntryMode) -> anyhow::Result<Self> {
        match value {
            EntryMode::File(mode) => Ok(mode),
            EntryMode::Directory => Err(anyhow::anyhow!("Invalid file mode: directory")),
        }
    }
}

impl TryFrom<&str> for EntryMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        Self::from_octal_str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("100644", EntryMode::File(FileMode::Regular))]
    #[case("100755", EntryMode::File(FileMode::Executable))]
    #[case("100664", EntryMode::File(FileMode::Regular))]
    #[case("120000", EntryMode::File(FileMode::Symlink))]
    #[case("40000", EntryMode::Directory)]
    fn parses_octal_modes(#[case] raw: &str, #[case] expected: EntryMode) {
        assert_eq!(EntryMode::from_octal_str(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("160000")]
    #[case("banana")]
    #[case("")]
    fn rejects_unsupported_modes(#[case] raw: &str) {
        assert!(EntryMode::from_octal_str(raw).is_err());
    }
}
