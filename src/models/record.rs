use crate::models::schema::{EntityKind, MetadataError, MetadataSchema, ValueKind};
use crate::paths::{create_relative_path, resolve_relative_path};
use crate::xml::XmlNode;
use camino::Utf8Path;
use indexmap::IndexMap;
use std::sync::Arc;

/// Runtime key/value metadata for one entity, shaped by its schema.
///
/// Every declared key is always present. Values are kept as strings and
/// parsed on read; [`get_int`](Self::get_int) and
/// [`get_float`](Self::get_float) treat unparseable text as zero.
///
/// The change flag is a simple dirty bit: any [`set`](Self::set) raises it,
/// even when the value is unchanged, and callers clear it after persisting.
#[derive(Debug, Clone)]
pub struct MetadataRecord {
    schema: Arc<MetadataSchema>,
    values: IndexMap<String, String>,
    changed: bool,
}

impl MetadataRecord {
    /// Record with every field at its declared default
    pub fn new(schema: Arc<MetadataSchema>) -> Self {
        let values = schema
            .fields()
            .iter()
            .map(|f| (f.key.to_string(), f.default_value.to_string()))
            .collect();

        Self {
            schema,
            values,
            changed: false,
        }
    }

    /// Hydrate a record from the children of `node`.
    ///
    /// Missing fields take their default. PATH fields are expanded against
    /// `relative_to`. The result is unchanged.
    ///
    /// # Arguments
    /// * `schema` - Schema of the entity kind `node` describes
    /// * `node` - Element whose children hold one value per field
    /// * `relative_to` - Base directory for `./` paths
    pub fn from_xml(schema: Arc<MetadataSchema>, node: &XmlNode, relative_to: &Utf8Path) -> Self {
        let mut values = IndexMap::with_capacity(schema.fields().len());

        for decl in schema.fields() {
            let value = match node.child(decl.key) {
                Some(md) if decl.kind == ValueKind::Path => {
                    resolve_relative_path(md.text(), relative_to, true)
                }
                Some(md) => md.text().to_string(),
                None => decl.default_value.to_string(),
            };
            values.insert(decl.key.to_string(), value);
        }

        Self {
            schema,
            values,
            changed: false,
        }
    }

    /// Append one child per field to `parent`, in schema order.
    ///
    /// With `ignore_defaults`, fields still at their default are left out.
    /// PATH fields are written relative to `relative_to` where possible.
    pub fn append_to_xml(&self, parent: &mut XmlNode, ignore_defaults: bool, relative_to: &Utf8Path) {
        for decl in self.schema.fields() {
            let Some(value) = self.values.get(decl.key) else {
                continue;
            };

            if ignore_defaults && value == decl.default_value {
                continue;
            }

            let value = if decl.kind == ValueKind::Path {
                create_relative_path(value, relative_to, true)
            } else {
                value.clone()
            };

            parent.push_child(XmlNode::with_text(decl.key, value));
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.schema.kind()
    }

    pub fn schema(&self) -> &MetadataSchema {
        &self.schema
    }

    /// Raw string value of `key`.
    ///
    /// # Errors
    /// [`MetadataError::UnknownKey`] when `key` was never declared or set.
    /// Asking for an undeclared key is a caller bug, so there is no default.
    pub fn get(&self, key: &str) -> Result<&str, MetadataError> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| MetadataError::UnknownKey(key.to_string()))
    }

    /// Integer value of `key`; text without a leading integer reads as 0
    pub fn get_int(&self, key: &str) -> Result<i32, MetadataError> {
        Ok(parse_leading_int(self.get(key)?))
    }

    pub fn get_float(&self, key: &str) -> Result<f32, MetadataError> {
        Ok(parse_leading_float(self.get(key)?))
    }

    /// `true` only for the literal value `"true"`
    pub fn get_bool(&self, key: &str) -> Result<bool, MetadataError> {
        Ok(self.get(key)? == "true")
    }

    /// Store `value` under `key` and mark the record changed.
    ///
    /// Keys outside the schema are kept in memory but never serialized.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
        self.changed = true;
    }

    /// Whether the current value of `key` equals its declared default
    pub fn is_default(&self, key: &str) -> bool {
        match (self.schema.field(key), self.values.get(key)) {
            (Some(decl), Some(value)) => value == decl.default_value,
            _ => false,
        }
    }

    /// Declared fields and their values, in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.schema
            .fields()
            .iter()
            .filter_map(|decl| self.values.get(decl.key).map(|v| (decl.key, v.as_str())))
    }

    pub fn was_changed(&self) -> bool {
        self.changed
    }

    pub fn reset_changed_flag(&mut self) {
        self.changed = false;
    }
}

/// Integer prefix of `s` after leading whitespace; 0 when there is none.
/// Out-of-range values saturate.
fn parse_leading_int(s: &str) -> i32 {
    let s = s.trim_start();
    let bytes = s.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return 0;
    }

    match s[..end].parse::<i64>() {
        Ok(v) => v.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
        Err(_) if s.starts_with('-') => i32::MIN,
        Err(_) => i32::MAX,
    }
}

/// Longest floating-point prefix of `s` after leading whitespace; 0.0 when
/// there is none.
fn parse_leading_float(s: &str) -> f32 {
    let s = s.trim_start();
    let bytes = s.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let mut seen_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        seen_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            seen_digit = true;
        }
    }
    if !seen_digit {
        return 0.0;
    }

    // Optional exponent, only taken when it has digits
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse::<f32>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::SchemaRegistry;

    fn game_record() -> MetadataRecord {
        MetadataRecord::new(SchemaRegistry::builtin().lookup(EntityKind::Game))
    }

    #[test]
    fn test_new_record_has_defaults_and_is_clean() {
        let record = game_record();
        for decl in record.schema().fields() {
            assert_eq!(record.get(decl.key).unwrap(), decl.default_value);
        }
        assert!(!record.was_changed());
        assert_eq!(record.iter().count(), 18);
    }

    #[test]
    fn test_set_marks_changed_even_when_unchanged() {
        let mut record = game_record();
        record.set("players", "1");
        assert!(record.was_changed());

        record.reset_changed_flag();
        assert!(!record.was_changed());
    }

    #[test]
    fn test_get_undeclared_key_is_error() {
        let record = game_record();
        assert_eq!(
            record.get("nonexistent"),
            Err(MetadataError::UnknownKey("nonexistent".to_string()))
        );
        assert!(record.get_int("nonexistent").is_err());
    }

    #[test]
    fn test_folder_record_has_no_favorite() {
        let record = MetadataRecord::new(SchemaRegistry::builtin().lookup(EntityKind::Folder));
        assert!(record.get("favorite").is_err());
        assert_eq!(record.kind(), EntityKind::Folder);
    }

    #[test]
    fn test_numeric_accessors_are_lenient() {
        let mut record = game_record();
        record.set("players", "four");
        assert_eq!(record.get_int("players").unwrap(), 0);

        record.set("players", " 2-4");
        assert_eq!(record.get_int("players").unwrap(), 2);

        record.set("rating", "0.75");
        assert!((record.get_float("rating").unwrap() - 0.75).abs() < f32::EPSILON);

        record.set("rating", "n/a");
        assert_eq!(record.get_float("rating").unwrap(), 0.0);

        record.set("rating", "1e");
        assert_eq!(record.get_float("rating").unwrap(), 1.0);
    }

    #[test]
    fn test_parse_leading_int_saturates() {
        assert_eq!(parse_leading_int("99999999999"), i32::MAX);
        assert_eq!(parse_leading_int("-99999999999"), i32::MIN);
        assert_eq!(parse_leading_int("-"), 0);
        assert_eq!(parse_leading_int("+7x"), 7);
    }

    #[test]
    fn test_parse_leading_float_forms() {
        assert_eq!(parse_leading_float(".5"), 0.5);
        assert_eq!(parse_leading_float("-2.5e2abc"), -250.0);
        assert_eq!(parse_leading_float("."), 0.0);
    }

    #[test]
    fn test_from_xml_fills_missing_fields_with_defaults() {
        let mut node = XmlNode::new("game");
        node.push_child(XmlNode::with_text("name", "Contra"));
        node.push_child(XmlNode::with_text("image", "./boxart/contra.png"));

        let schema = SchemaRegistry::builtin().lookup(EntityKind::Game);
        let record = MetadataRecord::from_xml(schema, &node, Utf8Path::new("/roms/nes"));

        assert_eq!(record.get("name").unwrap(), "Contra");
        assert_eq!(record.get("image").unwrap(), "/roms/nes/boxart/contra.png");
        assert_eq!(record.get("developer").unwrap(), "알수없음");
        assert_eq!(record.iter().count(), 18);
        assert!(!record.was_changed());
    }

    #[test]
    fn test_append_to_xml_follows_schema_order() {
        let mut record = game_record();
        record.set("playcount", "3");
        record.set("genre", "Shooter");
        record.set("name", "Contra");

        let mut node = XmlNode::new("game");
        record.append_to_xml(&mut node, true, Utf8Path::new("/roms/nes"));

        let tags: Vec<&str> = node.children().iter().map(|c| c.tag()).collect();
        assert_eq!(tags, vec!["name", "genre", "playcount"]);
    }

    #[test]
    fn test_append_to_xml_writes_everything_without_suppression() {
        let record = game_record();
        let mut node = XmlNode::new("game");
        record.append_to_xml(&mut node, false, Utf8Path::new("/roms/nes"));
        assert_eq!(node.children().len(), 18);
    }

    #[test]
    fn test_undeclared_keys_are_not_serialized() {
        let mut record = game_record();
        record.set("scraper_id", "42");
        assert_eq!(record.get("scraper_id").unwrap(), "42");

        let mut node = XmlNode::new("game");
        record.append_to_xml(&mut node, true, Utf8Path::new(""));
        assert!(node.child("scraper_id").is_none());
    }

    #[test]
    fn test_compact_output_drops_written_out_defaults() {
        let xml = "<folder><name>Shooters</name><thumbnail>./t.png</thumbnail>\
                   <image>./i.png</image><releasedate>날짜없음</releasedate>\
                   <developer>알수없음</developer><genre>Shooter</genre></folder>";
        let node = XmlNode::parse(xml).unwrap();
        let schema = SchemaRegistry::builtin().lookup(EntityKind::Folder);
        let record = MetadataRecord::from_xml(schema, &node, Utf8Path::new("/roms/nes"));
        assert!(record.is_default("developer"));
        assert!(record.is_default("releasedate"));

        let mut out = XmlNode::new("folder");
        record.append_to_xml(&mut out, true, Utf8Path::new("/roms/nes"));
        let tags: Vec<&str> = out.children().iter().map(|c| c.tag()).collect();
        assert_eq!(tags, vec!["name", "image", "thumbnail", "genre"]);
    }
}
