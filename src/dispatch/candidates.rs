//! Static candidate table

use crate::backends::BackendId;
use crate::intents::IntentKind;

/// Backends to try for an intent, most preferred first
///
/// Multi-source batches have no candidates of their own; they are split into
/// one by-target dispatch per source.
pub fn candidates(kind: IntentKind) -> &'static [BackendId] {
    use BackendId::*;
    use IntentKind::*;

    match kind {
        ByTarget | ByProposal | LineCoverage => &[Alminer, Tap],
        ByPosition => &[Tap, Alminer],
        ByFrequency | ByResolution | ByBibliography | ByMemberOus | ByDataType
        | ByScienceKeyword | ByAbstract | BySensitivity | RawQuery | BySourceName => &[Tap],
        ResolveTarget => &[Simbad],
        InfoLookup => &[Reference],
        MultiSource => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_orders() {
        assert_eq!(candidates(IntentKind::ByTarget), &[BackendId::Alminer, BackendId::Tap]);
        assert_eq!(candidates(IntentKind::ByPosition), &[BackendId::Tap, BackendId::Alminer]);
        assert_eq!(candidates(IntentKind::RawQuery), &[BackendId::Tap]);
        assert!(candidates(IntentKind::MultiSource).is_empty());
    }

    #[test]
    fn test_candidates_serve_their_intents() {
        use crate::backends::{Alminer, ArchiveOptions, Backend, Reference, Simbad, Tap};
        use crate::network::HttpClient;

        let client = HttpClient::new().unwrap();
        let backends: Vec<Box<dyn Backend>> = vec![
            Box::new(Alminer::new(client.clone(), None, ArchiveOptions::default())),
            Box::new(Tap::new(client.clone(), None, ArchiveOptions::default())),
            Box::new(Simbad::new(client)),
            Box::new(Reference::new()),
        ];

        for kind in IntentKind::ALL {
            for id in candidates(kind) {
                let backend = backends.iter().find(|b| b.id() == *id).unwrap();
                assert!(backend.supports(kind), "{} does not serve {}", id, kind);
            }
        }
    }
}
