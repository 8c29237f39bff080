use std::io::BufRead;

/// Upper bound on the header's decimal length field
const MAX_SIZE_DIGITS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectType {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
            ObjectType::Tag => "tag",
        }
    }

    /// Encode the `<type> <size>\0` header that prefixes every object
    pub fn header(&self, size: usize) -> String {
        format!("{} {}\0", self.as_str(), size)
    }

    /// Parse the `<type> <size>\0` header, leaving the reader at the content
    pub fn parse_object_header(data_reader: &mut impl BufRead) -> anyhow::Result<(ObjectType, usize)> {
        let mut object_type = Vec::new();
        data_reader.read_until(b' ', &mut object_type)?;
        if object_type.pop() != Some(b' ') {
            anyhow::bail!("Missing separator after object type");
        }

        let object_type = std::str::from_utf8(&object_type)?;
        let object_type = ObjectType::try_from(object_type)?;

        let mut size = Vec::new();
        data_reader.read_until(b'\0', &mut size)?;
        if size.pop() != Some(b'\0') {
            anyhow::bail!("Missing terminator after object size");
        }
        if size.is_empty() || size.len() > MAX_SIZE_DIGITS || !size.iter().all(u8::is_ascii_digit) {
            anyhow::bail!("Invalid object size field");
        }
        let size = std::str::from_utf8(&size)?.parse::<usize>()?;

        Ok((object_type, size))
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            "commit" => Ok(ObjectType::Commit),
            "tag" => Ok(ObjectType::Tag),
            _ => Err(anyhow::anyhow!("Invalid object type: {value}")),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    #[test]
    fn parses_header_and_leaves_content() {
        let mut reader = Cursor::new(b"tag 5\0hello".to_vec());

        let (object_type, size) = ObjectType::parse_object_header(&mut reader).unwrap();

        assert_eq!(object_type, ObjectType::Tag);
        assert_eq!(size, 5);
        assert_eq!(reader.position(), 6);
    }

    #[rstest]
    #[case(b"blob5\0hello".as_slice())]
    #[case(b"blob 5hello".as_slice())]
    #[case(b"blob -5\0hello".as_slice())]
    #[case(b"bolb 5\0hello".as_slice())]
    #[case(b"".as_slice())]
    fn rejects_malformed_headers(#[case] raw: &[u8]) {
        assert!(ObjectType::parse_object_header(&mut Cursor::new(raw)).is_err());
    }
}
