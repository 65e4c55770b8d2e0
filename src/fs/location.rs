use wsfs_api::fs::Parent;
use wsfs_lib::segment;

use super::ResourcePath;

fn base(root: &str, path: &ResourcePath) -> String {
    if path.is_root() {
        root.to_owned()
    } else {
        format!("{root}/{}", segment::encode_all(path.segments()))
    }
}

/// canonical url of a resource. directories always end with `/`, files never
/// do
pub fn location(root: &str, path: &ResourcePath, is_dir: bool) -> String {
    let mut rtn = base(root, path);

    if is_dir {
        rtn.push('/');
    }

    rtn
}

pub fn children_location(root: &str, path: &ResourcePath) -> String {
    format!("{}?depth=1", base(root, path))
}

/// ancestor directories of `path`, nearest first, excluding the workspace
/// directory itself
pub fn parents(root: &str, path: &ResourcePath) -> Vec<Parent> {
    let mut rtn = Vec::new();
    let mut current = path.parent();

    while let Some(dir) = current {
        if dir.is_root() {
            break;
        }

        rtn.push(Parent {
            name: dir.name().to_owned(),
            location: base(root, &dir),
            children_location: children_location(root, &dir),
        });

        current = dir.parent();
    }

    rtn
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn locations() {
        let dir = ResourcePath::root().join("project").join("my folder");
        let file = dir.join("buzz.txt");

        assert_eq!(location("/file", &dir, true), "/file/project/my%20folder/");
        assert_eq!(location("/file", &file, false), "/file/project/my%20folder/buzz.txt");
        assert_eq!(location("/file", &ResourcePath::root(), true), "/file/");
        assert_eq!(children_location("/file", &dir), "/file/project/my%20folder?depth=1");
        assert_eq!(children_location("/file", &ResourcePath::root()), "/file?depth=1");
    }

    #[test]
    fn parent_chain() {
        let file = ResourcePath::root()
            .join("project")
            .join("my folder")
            .join("buzz.txt");
        let list = parents("/file", &file);

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "my folder");
        assert_eq!(list[0].location, "/file/project/my%20folder");
        assert_eq!(list[0].children_location, "/file/project/my%20folder?depth=1");
        assert_eq!(list[1].name, "project");
        assert_eq!(list[1].location, "/file/project");

        let top = ResourcePath::root().join("project");

        assert!(parents("/file", &top).is_empty());
        assert!(parents("/file", &ResourcePath::root()).is_empty());
    }
}
