use std::fmt;
use std::str::FromStr;

use crate::Word;

/// Values to preload into the input queue, given as `1,2,3`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InputList(Vec<Word>);

impl InputList {
    pub fn values(&self) -> &[Word] {
        &self.0
    }
}

impl From<Vec<Word>> for InputList {
    fn from(values: Vec<Word>) -> Self {
        InputList(values)
    }
}

impl FromStr for InputList {
    type Err = String;
    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let mut values = Vec::new();
        for item in string.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let value = item.parse::<Word>().map_err(|_| {
                format!("'{item}' is not an integer, provide integers separated by commas")
            })?;
            values.push(value);
        }
        Ok(InputList(values))
    }
}

impl fmt::Display for InputList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_list() {
        let list: InputList = "1, 2,3 ,,-4".parse().unwrap();
        assert_eq!(list.values(), &[1, 2, 3, -4]);
        assert_eq!(list.to_string(), "1,2,3,-4");
    }

    #[test]
    fn empty_list() {
        assert_eq!("".parse::<InputList>(), Ok(InputList::default()));
        assert_eq!(" , ".parse::<InputList>(), Ok(InputList::default()));
    }

    #[test]
    fn rejects_non_integers() {
        let err = "1,two,3".parse::<InputList>().unwrap_err();
        assert!(err.contains("'two'"), "{err}");
    }
}
