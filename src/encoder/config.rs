/// Encoder-Konfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Statische Dictionary-Referenzen für Namen, Namespaces und Text verwenden.
    pub use_dictionary: bool,
    /// Session-Variante: nicht-statische Namen und Namespace-URIs in eine
    /// Session-Tabelle aufnehmen und den String-Table-Block voranstellen.
    pub session_dictionary: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            use_dictionary: true,
            session_dictionary: false,
        }
    }
}

impl EncoderConfig {
    /// Konfiguration der Session-Variante.
    pub fn session() -> Self {
        Self {
            session_dictionary: true,
            ..Self::default()
        }
    }

    /// Alle Strings inline (keine Dictionary-Referenzen).
    pub fn inline_only() -> Self {
        Self {
            use_dictionary: false,
            session_dictionary: false,
        }
    }

    pub fn with_dictionary(mut self, enabled: bool) -> Self {
        self.use_dictionary = enabled;
        self
    }

    pub fn with_session_dictionary(mut self, enabled: bool) -> Self {
        self.session_dictionary = enabled;
        self
    }
}
