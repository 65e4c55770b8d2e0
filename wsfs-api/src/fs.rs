use serde::{Serialize, Deserialize};

/// permission flags reported for an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Attributes {
    pub read_only: bool,
    pub executable: bool,
}

/// one ancestor directory of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parent {
    pub name: String,
    pub location: String,
    pub children_location: String,
}

/// metadata projection of a file or directory.
///
/// `etag` and `length` are only set for files. `children_location` is only
/// set for directories and `children` only when a listing was requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Metadata {
    pub name: String,
    pub directory: bool,
    pub location: String,

    #[serde(rename = "ETag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,

    pub attributes: Attributes,
    pub local_time_stamp: i64,
    pub parents: Vec<Parent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Metadata>>,
}

impl Metadata {
    pub fn is_dir(&self) -> bool {
        self.directory
    }
}

/// optional json body of a create/copy/move request
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateItem {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub directory: bool,

    #[serde(default)]
    pub location: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn file_metadata_field_names() {
        let meta = Metadata {
            name: String::from("fizz.txt"),
            directory: false,
            location: String::from("/file/project/fizz.txt"),
            etag: Some(String::from("abc")),
            length: Some(11),
            attributes: Attributes {
                read_only: false,
                executable: false,
            },
            local_time_stamp: 1,
            parents: vec![Parent {
                name: String::from("project"),
                location: String::from("/file/project"),
                children_location: String::from("/file/project?depth=1"),
            }],
            children_location: None,
            children: None,
        };

        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(json["ETag"], "abc");
        assert_eq!(json["LocalTimeStamp"], 1);
        assert_eq!(json["Attributes"]["ReadOnly"], false);
        assert_eq!(json["Parents"][0]["ChildrenLocation"], "/file/project?depth=1");
        assert!(json.get("Children").is_none());
        assert!(json.get("ChildrenLocation").is_none());
    }

    #[test]
    fn create_item_defaults() {
        let item: CreateItem = serde_json::from_str(r#"{"Name":"new directory","Directory":true}"#).unwrap();

        assert_eq!(item.name.as_deref(), Some("new directory"));
        assert!(item.directory);
        assert!(item.location.is_none());

        let item: CreateItem = serde_json::from_str("{}").unwrap();

        assert!(!item.directory);
    }
}
