//! Fixed categorical option lists for fixture attributes.
//!
//! List order is the column order of the exported sheet; do not reorder.

use crate::spec::EnumAttributeValue;

/// Sentinel option selecting a free-text elaboration.
pub const C_OPTION_OTHER: &str = "autre (préciser)";

pub const L_OPTIONS_TYPE_LUMINAIRE: &[&str] = &[
    "réglette simple",
    "réglette étanche",
    "luminaire sur rail",
    "bande lumineuse",
    "luminaire sur pieds",
    "lum. à réflecteur carré",
    "lum. à réflecteur rectangle",
    "lum. à réflecteur rond",
    "luminaire en saillie",
    "spot",
    "downlight",
    C_OPTION_OTHER,
    "luminaire LED déjà remplacé — avec gestion",
    "luminaire LED déjà remplacé — sans gestion",
];

pub const L_OPTIONS_SITUATION_POSE: &[&str] = &["au plafond", "mural", "au sol"];

pub const L_OPTIONS_TYPE_SUPPORT: &[&str] = &[
    "Béton brut",
    "Bac métallique",
    "plaque fibre",
    "plaque Schichtex",
    "plâtre staff",
    C_OPTION_OTHER,
];

pub const L_OPTIONS_TYPE_SOURCE_LUMINEUSE: &[&str] = &[
    "Tube fluorescent T5",
    "Tube fluorescent T8",
    "Tube fluorescent T12",
    "Tube fluorescent T9 (circul.)",
    "Tube fluoc. simple tube (1U)",
    "Tube fluoc. double tubes (2U)",
    "Tube fluoc. triple tubes (3U)",
    "Retrofit Led",
    "Incandescente",
    C_OPTION_OTHER,
];

pub const L_OPTIONS_AFFECTATION_LUMINAIRE: &[&str] = &[
    "Salle de classe",
    "Administration",
    "Circulation",
    "Aula",
    "Cafétéria/cuisine",
    "Salle de gym",
    "Sanitaire",
    "Vestiaire",
    "Bibliothèque - C-Doc",
    "Economat",
    "Stockage/technique",
    "Extérieur",
    C_OPTION_OTHER,
];

pub const L_OPTIONS_MOYEN_LEVAGE: &[&str] = &["hauteur inf à 4m", "hauteur supérieur à 4m"];

/// Closed set of categorical fixture attributes, in sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnumAttributeKey {
    TypeLuminaire,
    SituationPose,
    TypeSupport,
    TypeSourceLumineuse,
    AffectationLuminaire,
    MoyenLevage,
}

impl EnumAttributeKey {
    /// All keys in column-group order.
    pub const ALL: [EnumAttributeKey; 6] = [
        EnumAttributeKey::TypeLuminaire,
        EnumAttributeKey::SituationPose,
        EnumAttributeKey::TypeSupport,
        EnumAttributeKey::TypeSourceLumineuse,
        EnumAttributeKey::AffectationLuminaire,
        EnumAttributeKey::MoyenLevage,
    ];

    /// Ordered option list.
    pub fn options(self) -> &'static [&'static str] {
        match self {
            EnumAttributeKey::TypeLuminaire => L_OPTIONS_TYPE_LUMINAIRE,
            EnumAttributeKey::SituationPose => L_OPTIONS_SITUATION_POSE,
            EnumAttributeKey::TypeSupport => L_OPTIONS_TYPE_SUPPORT,
            EnumAttributeKey::TypeSourceLumineuse => L_OPTIONS_TYPE_SOURCE_LUMINEUSE,
            EnumAttributeKey::AffectationLuminaire => L_OPTIONS_AFFECTATION_LUMINAIRE,
            EnumAttributeKey::MoyenLevage => L_OPTIONS_MOYEN_LEVAGE,
        }
    }

    /// Group label shown above the option columns.
    pub fn display_label(self) -> &'static str {
        match self {
            EnumAttributeKey::TypeLuminaire => "Type de luminaire",
            EnumAttributeKey::SituationPose => "Situation de pose",
            EnumAttributeKey::TypeSupport => "Type de support",
            EnumAttributeKey::TypeSourceLumineuse => "Type de source lumineuse",
            EnumAttributeKey::AffectationLuminaire => "Affectation du luminaire",
            EnumAttributeKey::MoyenLevage => "Moyen levage",
        }
    }

    /// Field name in the stored document.
    pub fn field_name(self) -> &'static str {
        match self {
            EnumAttributeKey::TypeLuminaire => "type_luminaire",
            EnumAttributeKey::SituationPose => "situation_pose",
            EnumAttributeKey::TypeSupport => "type_support",
            EnumAttributeKey::TypeSourceLumineuse => "type_source_lumineuse",
            EnumAttributeKey::AffectationLuminaire => "affectation_luminaire",
            EnumAttributeKey::MoyenLevage => "moyen_levage",
        }
    }

    /// Short key used in the `(<key>: <text>)` type-label elaboration.
    pub fn elaboration_key(self) -> &'static str {
        match self {
            EnumAttributeKey::TypeLuminaire => "type",
            EnumAttributeKey::SituationPose => "pose",
            EnumAttributeKey::TypeSupport => "support",
            EnumAttributeKey::TypeSourceLumineuse => "source",
            EnumAttributeKey::AffectationLuminaire => "affectation",
            EnumAttributeKey::MoyenLevage => "levage",
        }
    }

    /// Whether the list carries the [`C_OPTION_OTHER`] sentinel.
    pub fn allows_other(self) -> bool {
        self.options().contains(&C_OPTION_OTHER)
    }

    /// Offset of `value` within this key's option list, if registry-valid.
    pub fn position(self, value: &EnumAttributeValue) -> Option<usize> {
        let c_option = match value {
            EnumAttributeValue::Known(val) => val.as_str(),
            EnumAttributeValue::Other(_) => C_OPTION_OTHER,
        };
        self.options().iter().position(|opt| *opt == c_option)
    }

    /// First option of the list, used as form default.
    pub fn default_value(self) -> EnumAttributeValue {
        let c_first = self.options().first().copied().unwrap_or_default();
        EnumAttributeValue::Known(c_first.to_string())
    }
}

/// One column group of the exported table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecAttributeGroup {
    /// Attribute whose value selects the marked column.
    pub key: EnumAttributeKey,
    /// Label spanning the group.
    pub display_label: &'static str,
    /// One column per option.
    pub options: &'static [&'static str],
}

/// Column groups for every attribute, in sheet order.
pub fn derive_attribute_groups() -> Vec<SpecAttributeGroup> {
    EnumAttributeKey::ALL
        .iter()
        .map(|key| SpecAttributeGroup {
            key: *key,
            display_label: key.display_label(),
            options: key.options(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_48_option_columns() {
        let n_cols: usize = derive_attribute_groups()
            .iter()
            .map(|group| group.options.len())
            .sum();
        assert_eq!(n_cols, 48);
    }

    #[test]
    fn test_other_sentinel_only_where_listed() {
        assert!(EnumAttributeKey::TypeSupport.allows_other());
        assert!(EnumAttributeKey::AffectationLuminaire.allows_other());
        assert!(!EnumAttributeKey::SituationPose.allows_other());
        assert!(!EnumAttributeKey::MoyenLevage.allows_other());
    }

    #[test]
    fn test_position_maps_other_to_sentinel_column() {
        let key = EnumAttributeKey::TypeSupport;
        assert_eq!(
            key.position(&EnumAttributeValue::Known("Béton brut".to_string())),
            Some(0)
        );
        assert_eq!(
            key.position(&EnumAttributeValue::Other("bois".to_string())),
            Some(5)
        );
        assert_eq!(
            key.position(&EnumAttributeValue::Known("marbre".to_string())),
            None
        );
        assert_eq!(
            EnumAttributeKey::MoyenLevage.position(&EnumAttributeValue::Other(String::new())),
            None
        );
    }
}
