//! Tabular query results returned to the editor UI

use std::collections::BTreeMap;

use crate::application::dto::CallValue;

/// Column header plus one value list per row
#[derive(Debug, Clone, PartialEq)]
pub struct Rowset {
    pub header: Vec<&'static str>,
    pub lines: Vec<Vec<CallValue>>,
}

impl Rowset {
    pub fn new(header: &[&'static str]) -> Self {
        Self {
            header: header.to_vec(),
            lines: Vec::new(),
        }
    }

    pub fn push(&mut self, line: Vec<CallValue>) {
        debug_assert_eq!(line.len(), self.header.len());
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Value of `column` in row `index`
    pub fn get(&self, index: usize, column: &str) -> Option<&CallValue> {
        let position = self.header.iter().position(|name| *name == column)?;
        self.lines.get(index)?.get(position)
    }
}

impl From<Rowset> for CallValue {
    fn from(rowset: Rowset) -> Self {
        let mut map = BTreeMap::new();
        map.insert(
            "header".to_string(),
            CallValue::List(rowset.header.into_iter().map(CallValue::from).collect()),
        );
        map.insert(
            "lines".to_string(),
            CallValue::List(rowset.lines.into_iter().map(CallValue::List).collect()),
        );
        CallValue::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rowset_encoding() {
        let mut rowset = Rowset::new(&["archetypeID", "archetypeName"]);
        rowset.push(vec![1i64.into(), "Combat Site".into()]);

        assert_eq!(rowset.get(0, "archetypeName"), Some(&"Combat Site".into()));
        assert_eq!(rowset.get(0, "missing"), None);

        let json = serde_json::to_value(CallValue::from(rowset)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "header": ["archetypeID", "archetypeName"],
                "lines": [[1, "Combat Site"]]
            })
        );
    }
}
