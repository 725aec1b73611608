//! 内容区块

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// 作品集的内容区块，每个区块对应一张同名的表
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Section {
    Hero,
    About,
    ContactInfo,
    Skills,
    Projects,
    Experience,
}

impl Section {
    pub fn table(self) -> &'static str {
        self.into()
    }

    /// 每个租户只有一行的区块
    pub fn is_singleton(self) -> bool {
        matches!(self, Section::Hero | Section::About | Section::ContactInfo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portfolify_common::storage::db::{COLLECTION_CONTENT_TABLES, SINGLETON_CONTENT_TABLES};
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_sections_match_schema() {
        for section in Section::iter() {
            let tables: &[&str] = if section.is_singleton() {
                &SINGLETON_CONTENT_TABLES
            } else {
                &COLLECTION_CONTENT_TABLES
            };
            assert!(tables.contains(&section.table()), "{section} has no table");
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(Section::from_str("contact_info").unwrap(), Section::ContactInfo);
        assert_eq!(Section::from_str("skills").unwrap(), Section::Skills);
        assert!(Section::from_str("Skills").is_err());
        assert!(Section::from_str("secrets").is_err());
    }
}
