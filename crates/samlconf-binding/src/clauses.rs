//! Identifiers of the normative SAML 2.0 sentences a violation can cite.
//!
//! Naming follows `<Document>_<section>_<sentence>`, e.g. `Bindings_3_5_4_a`
//! is sentence "a" of section 3.5.4 of the Bindings document. The `1`/`2`
//! suffixed variants are the error-reporting counterparts used when the
//! identity provider was deliberately driven into an error.

use std::fmt;

/// A clause of the SAML 2.0 Bindings or Profiles specification.
#[allow(non_camel_case_types, missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clause {
    // 3.4 HTTP Redirect Binding
    Bindings_3_4_3_a,
    Bindings_3_4_3_b,
    Bindings_3_4_3_b1,
    Bindings_3_4_4_a,
    Bindings_3_4_4_1,
    Bindings_3_4_4_1_a,
    Bindings_3_4_4_1_a1,
    Bindings_3_4_4_1_a2,
    Bindings_3_4_4_1_b,
    Bindings_3_4_4_1_b1,
    Bindings_3_4_5_2_a,
    Bindings_3_4_6_a,

    // 3.5 HTTP POST Binding
    Bindings_3_5_3_a,
    Bindings_3_5_3_b,
    Bindings_3_5_4_a,
    Bindings_3_5_4_a1,
    Bindings_3_5_4_a2,
    Bindings_3_5_4_b,
    Bindings_3_5_4_b1,
    Bindings_3_5_4_c,
    Bindings_3_5_4_d,
    Bindings_3_5_5_2_a,
    Bindings_3_5_6_a,

    // 4.1 Web Browser SSO Profile
    Profiles_4_1_4_5_a,
}

impl Clause {
    /// Returns the printable clause id, e.g. `SAMLBindings.3.5.4_a`.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::Bindings_3_4_3_a => "SAMLBindings.3.4.3_a",
            Self::Bindings_3_4_3_b => "SAMLBindings.3.4.3_b",
            Self::Bindings_3_4_3_b1 => "SAMLBindings.3.4.3_b1",
            Self::Bindings_3_4_4_a => "SAMLBindings.3.4.4_a",
            Self::Bindings_3_4_4_1 => "SAMLBindings.3.4.4.1",
            Self::Bindings_3_4_4_1_a => "SAMLBindings.3.4.4.1_a",
            Self::Bindings_3_4_4_1_a1 => "SAMLBindings.3.4.4.1_a1",
            Self::Bindings_3_4_4_1_a2 => "SAMLBindings.3.4.4.1_a2",
            Self::Bindings_3_4_4_1_b => "SAMLBindings.3.4.4.1_b",
            Self::Bindings_3_4_4_1_b1 => "SAMLBindings.3.4.4.1_b1",
            Self::Bindings_3_4_5_2_a => "SAMLBindings.3.4.5.2_a",
            Self::Bindings_3_4_6_a => "SAMLBindings.3.4.6_a",
            Self::Bindings_3_5_3_a => "SAMLBindings.3.5.3_a",
            Self::Bindings_3_5_3_b => "SAMLBindings.3.5.3_b",
            Self::Bindings_3_5_4_a => "SAMLBindings.3.5.4_a",
            Self::Bindings_3_5_4_a1 => "SAMLBindings.3.5.4_a1",
            Self::Bindings_3_5_4_a2 => "SAMLBindings.3.5.4_a2",
            Self::Bindings_3_5_4_b => "SAMLBindings.3.5.4_b",
            Self::Bindings_3_5_4_b1 => "SAMLBindings.3.5.4_b1",
            Self::Bindings_3_5_4_c => "SAMLBindings.3.5.4_c",
            Self::Bindings_3_5_4_d => "SAMLBindings.3.5.4_d",
            Self::Bindings_3_5_5_2_a => "SAMLBindings.3.5.5.2_a",
            Self::Bindings_3_5_6_a => "SAMLBindings.3.5.6_a",
            Self::Profiles_4_1_4_5_a => "SAMLProfiles.4.1.4.5_a",
        }
    }

    /// Returns the section heading the clause belongs to.
    #[must_use]
    pub const fn section(&self) -> &'static str {
        match self {
            Self::Bindings_3_4_3_a | Self::Bindings_3_4_3_b | Self::Bindings_3_4_3_b1 => {
                "3.4.3 RelayState"
            }
            Self::Bindings_3_4_4_a => "3.4.4 Message Encoding",
            Self::Bindings_3_4_4_1
            | Self::Bindings_3_4_4_1_a
            | Self::Bindings_3_4_4_1_a1
            | Self::Bindings_3_4_4_1_a2
            | Self::Bindings_3_4_4_1_b
            | Self::Bindings_3_4_4_1_b1 => "3.4.4.1 DEFLATE Encoding",
            Self::Bindings_3_4_5_2_a | Self::Bindings_3_5_5_2_a => "Security Considerations",
            Self::Bindings_3_4_6_a | Self::Bindings_3_5_6_a => "Error Reporting",
            Self::Bindings_3_5_3_a | Self::Bindings_3_5_3_b => "3.5.3 RelayState",
            Self::Bindings_3_5_4_a
            | Self::Bindings_3_5_4_a1
            | Self::Bindings_3_5_4_a2
            | Self::Bindings_3_5_4_b
            | Self::Bindings_3_5_4_b1
            | Self::Bindings_3_5_4_c
            | Self::Bindings_3_5_4_d => "3.5.4 Message Encoding",
            Self::Profiles_4_1_4_5_a => "4.1.4.5 POST-Specific Processing Rules",
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Joins clause ids for display, e.g. `SAMLBindings.3.5.4_a, SAMLBindings.3.5.4_b`.
#[must_use]
pub fn join(clauses: &[Clause]) -> String {
    clauses
        .iter()
        .map(Clause::id)
        .collect::<Vec<_>>()
        .join(", ")
}
