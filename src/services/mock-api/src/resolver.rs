//! Mode resolution: decides whether one request goes live or to fixtures.

use crate::models::{ApiMode, RouteMode};

/// Effective routing for one request.
///
/// Priority: per-call force, then (hybrid only) the endpoint override, the
/// endpoint's default mode, and finally `Mock` for unknown endpoints. Outside
/// hybrid mode the global mode applies to every endpoint; `Json` routes like
/// `Mock`.
pub fn resolve_mode(
    forced: Option<RouteMode>,
    global: ApiMode,
    override_mode: Option<RouteMode>,
    default_mode: Option<RouteMode>,
) -> RouteMode {
    if let Some(mode) = forced {
        return mode;
    }

    match global {
        ApiMode::Hybrid => override_mode.or(default_mode).unwrap_or(RouteMode::Mock),
        ApiMode::Live => RouteMode::Live,
        ApiMode::Mock | ApiMode::Json => RouteMode::Mock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_beats_everything() {
        for global in ApiMode::ALL {
            assert_eq!(
                resolve_mode(Some(RouteMode::Live), global, Some(RouteMode::Mock), Some(RouteMode::Mock)),
                RouteMode::Live
            );
            assert_eq!(
                resolve_mode(Some(RouteMode::Mock), global, Some(RouteMode::Live), Some(RouteMode::Live)),
                RouteMode::Mock
            );
        }
    }

    #[test]
    fn test_hybrid_chain() {
        assert_eq!(
            resolve_mode(None, ApiMode::Hybrid, Some(RouteMode::Live), Some(RouteMode::Mock)),
            RouteMode::Live
        );
        assert_eq!(
            resolve_mode(None, ApiMode::Hybrid, None, Some(RouteMode::Live)),
            RouteMode::Live
        );
        assert_eq!(resolve_mode(None, ApiMode::Hybrid, None, None), RouteMode::Mock);
    }

    #[test]
    fn test_global_modes_ignore_endpoint_settings() {
        assert_eq!(
            resolve_mode(None, ApiMode::Live, Some(RouteMode::Mock), Some(RouteMode::Mock)),
            RouteMode::Live
        );
        assert_eq!(
            resolve_mode(None, ApiMode::Mock, Some(RouteMode::Live), Some(RouteMode::Live)),
            RouteMode::Mock
        );
        assert_eq!(
            resolve_mode(None, ApiMode::Json, Some(RouteMode::Live), None),
            RouteMode::Mock
        );
    }
}
