//! Process-wide engine state.
//!
//! The engine keeps a registry of container signatures used to classify a
//! byte stream before it is handed to the decoder. State is initialized on
//! first use or explicitly via [`try_initialize`], and torn down with
//! [`try_shutdown`]; both are idempotent.

use parking_lot::RwLock;

/// A container signature probe: maps the head of a byte stream to a
/// human readable container type name.
struct FormatProbe {
    type_name: &'static str,
    matches: fn(&[u8]) -> bool,
}

static REGISTRY: RwLock<Vec<FormatProbe>> = RwLock::new(Vec::new());

fn default_probes() -> Vec<FormatProbe> {
    vec![
        FormatProbe {
            type_name: "TrueType Collection",
            matches: |data| data.starts_with(b"ttcf"),
        },
        FormatProbe {
            type_name: "OpenType",
            matches: |data| data.starts_with(b"OTTO"),
        },
        FormatProbe {
            type_name: "TrueType",
            matches: |data| data.starts_with(&[0x00, 0x01, 0x00, 0x00]) || data.starts_with(b"true"),
        },
    ]
}

/// Returns true if the engine is initialized.
pub fn is_initialized() -> bool {
    !REGISTRY.read().is_empty()
}

/// Initializes the engine, registering the default container signatures.
///
/// Normally not required: parsing entry points initialize the engine on
/// first use. Returns true if the engine is initialized after the call.
/// Calling this repeatedly is a safe no-op.
pub fn try_initialize() -> bool {
    let mut registry = REGISTRY.write();
    if registry.is_empty() {
        *registry = default_probes();
        log::debug!("engine initialized with {} container probes", registry.len());
    }
    true
}

/// Shuts the engine down, clearing the signature registry.
///
/// Existing objects remain valid; the next parse re-initializes the
/// registry. Calling this repeatedly is a safe no-op. Returns true if the
/// engine is shut down after the call.
pub fn try_shutdown() -> bool {
    let mut registry = REGISTRY.write();
    if !registry.is_empty() {
        registry.clear();
        log::debug!("engine shut down");
    }
    true
}

/// Classifies a byte stream, initializing the engine if needed.
///
/// Returns the container type name, or `None` if no registered signature
/// matches.
pub(crate) fn detect(data: &[u8]) -> Option<&'static str> {
    try_initialize();
    REGISTRY
        .read()
        .iter()
        .find(|probe| (probe.matches)(data))
        .map(|probe| probe.type_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_and_shutdown_are_idempotent() {
        assert!(try_initialize());
        assert!(try_initialize());
        assert!(is_initialized());
        assert!(try_shutdown());
        assert!(try_shutdown());
        // detect() lazily re-initializes
        assert_eq!(detect(&[0x00, 0x01, 0x00, 0x00]), Some("TrueType"));
        assert!(is_initialized());
    }

    #[test]
    fn detect_known_signatures() {
        assert_eq!(detect(b"OTTO\x00\x00"), Some("OpenType"));
        assert_eq!(detect(b"ttcf\x00\x02"), Some("TrueType Collection"));
        assert_eq!(detect(b"true\x00\x01"), Some("TrueType"));
        assert_eq!(detect(b"not a font"), None);
        assert_eq!(detect(&[]), None);
    }
}
