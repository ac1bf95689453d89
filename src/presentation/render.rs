use crate::application::hierarchy::HierarchyModel;
use crate::domain::items::item::{FileRef, Item, ItemKind};

const MASK: &str = "••••••••";

pub fn render_item(item: &Item) -> String {
    let body = match &item.kind {
        ItemKind::Group => match item.child_count() {
            Some(1) => format!("{}/ (1 item)", item.name),
            Some(n) => format!("{}/ ({n} items)", item.name),
            None => format!("{}/", item.name),
        },
        ItemKind::Link { text } => format!("{} -> {text}", item.name),
        ItemKind::Copy { text } => format!("{}: {text}", item.name),
        // Plaintext is only fetched on explicit reveal.
        ItemKind::Password { .. } => format!("{}: {MASK}", item.name),
        ItemKind::View { file } | ItemKind::File { file } => match file.first() {
            Some(f) => format!("{} [{}]", item.name, describe_file(f)),
            None => format!("{} [no file]", item.name),
        },
    };
    let shared = if item.token.is_some() { " (shared)" } else { "" };
    format!("{:>5}  {:<8} {body}{shared}", item.id, item.item_type().as_str())
}

fn describe_file(f: &FileRef) -> String {
    let name = if f.originalname.is_empty() {
        &f.filename
    } else {
        &f.originalname
    };
    format!("{name}, {}", human_size(f.size))
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

pub fn render_breadcrumb(model: &HierarchyModel) -> String {
    model
        .breadcrumb()
        .into_iter()
        .map(|c| c.label)
        .collect::<Vec<_>>()
        .join(" / ")
}

pub fn render_listing(model: &HierarchyModel) -> String {
    let mut out = render_breadcrumb(model);
    out.push('\n');
    if model.items().is_empty() {
        out.push_str("  (empty)\n");
    }
    for item in model.items() {
        out.push_str(&render_item(item));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::access::AccessScope;
    use crate::domain::items::item::{Ancestor, ItemParent};

    fn item(v: serde_json::Value) -> Item {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn each_kind_renders_its_payload() {
        let link = item(serde_json::json!({"id": 1, "name": "Docs", "type": "link", "text": "https://d"}));
        assert!(render_item(&link).ends_with("Docs -> https://d"));

        let pwd = item(serde_json::json!({"id": 2, "name": "Bank", "type": "password", "text": "hunter2"}));
        let shown = render_item(&pwd);
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains(MASK));

        let group = item(serde_json::json!({
            "id": 3, "name": "Work", "type": "group", "token": "T",
            "children": [{"id": 4, "name": "x", "type": "copy", "text": "y"}]
        }));
        assert!(render_item(&group).ends_with("Work/ (1 item) (shared)"));

        let file = item(serde_json::json!({
            "id": 5, "name": "Report", "type": "file",
            "file": [{"path": "uploads/r.pdf", "size": 2048, "originalname": "r.pdf"}]
        }));
        assert!(render_item(&file).ends_with("Report [r.pdf, 2.0 KB]"));

        let empty = item(serde_json::json!({"id": 6, "name": "Gone", "type": "view", "file": []}));
        assert!(render_item(&empty).ends_with("Gone [no file]"));
    }

    #[test]
    fn breadcrumb_joins_labels() {
        let model = HierarchyModel::new(
            AccessScope::full(),
            Some(2),
            vec![],
            Some(ItemParent {
                id: 2,
                name: "B".into(),
                parents: vec![Ancestor {
                    id: 1,
                    name: "A".into(),
                }],
            }),
        );
        assert_eq!(render_breadcrumb(&model), "Home / A / B");
        assert!(render_listing(&model).contains("(empty)"));
    }
}
