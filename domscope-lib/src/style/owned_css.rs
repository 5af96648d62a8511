use std::fmt;

/// Immutable snapshot of a single CSS declaration, in display form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleProperty {
    pub name: String,
    pub value: String,
}

impl StyleProperty {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        StyleProperty {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A fully-owned CSS stylesheet: style rules only (@media contents are
/// flattened in, @font-face and friends are skipped).
#[derive(Debug, Default)]
pub struct OwnedStylesheet {
    pub rules: Vec<OwnedRule>,
}

#[derive(Debug, Clone)]
pub struct OwnedRule {
    /// e.g. `div`, `.card`, `#header`, one entry per comma-separated part.
    pub selectors: Vec<String>,
    pub declarations: Vec<OwnedDeclaration>,
    /// Position across the whole registry, assigned at registration.
    pub source_order: u32,
}

impl OwnedRule {
    /// The selector list as authored, for display.
    pub fn selector_text(&self) -> String {
        self.selectors.join(", ")
    }
}

#[derive(Debug, Clone)]
pub struct OwnedDeclaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl fmt::Display for OwnedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {{", self.selector_text())?;
        for decl in &self.declarations {
            writeln!(f, "  {}: {};", decl.property, decl.value)?;
        }
        write!(f, "}}")
    }
}

/// Where a registered sheet came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetOrigin {
    /// An inline `<style>` element in the document.
    StyleElement,
    /// A `<link rel="stylesheet">` reference.
    Linked { href: String },
    /// Registered directly by the embedding caller.
    External,
}

/// A sheet's rule list, or the marker that its rules cannot be read.
/// Blocked sheets model the cross-origin access restriction: they are
/// skipped and counted during matching, never treated as errors.
#[derive(Debug)]
pub enum SheetAccess {
    Accessible(OwnedStylesheet),
    Blocked,
}

#[derive(Debug)]
pub struct RegisteredSheet {
    pub origin: SheetOrigin,
    pub access: SheetAccess,
}

/// All stylesheets known for one document, in registration order.
#[derive(Debug, Default)]
pub struct SheetRegistry {
    sheets: Vec<RegisteredSheet>,
    next_order: u32,
}

impl SheetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, origin: SheetOrigin, mut sheet: OwnedStylesheet) {
        for rule in &mut sheet.rules {
            rule.source_order = self.next_order;
            self.next_order += 1;
        }
        self.sheets.push(RegisteredSheet {
            origin,
            access: SheetAccess::Accessible(sheet),
        });
    }

    pub fn register_blocked(&mut self, origin: SheetOrigin) {
        self.sheets.push(RegisteredSheet {
            origin,
            access: SheetAccess::Blocked,
        });
    }

    pub fn sheets(&self) -> &[RegisteredSheet] {
        &self.sheets
    }

    /// Every rule of every accessible sheet, in source order.
    pub fn accessible_rules(&self) -> impl Iterator<Item = &OwnedRule> {
        self.sheets.iter().filter_map(|s| match &s.access {
            SheetAccess::Accessible(sheet) => Some(sheet.rules.iter()),
            SheetAccess::Blocked => None,
        })
        .flatten()
    }

    pub fn blocked_count(&self) -> usize {
        self.sheets
            .iter()
            .filter(|s| matches!(s.access, SheetAccess::Blocked))
            .count()
    }

    pub fn accessible_count(&self) -> usize {
        self.sheets.len() - self.blocked_count()
    }
}
