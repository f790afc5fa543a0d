//! Pure mapping from backend HTTP status to a retry decision.

/// What the ParallelExecutor / IntegrationExecutor should do after a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Do not retry this (key, model) pair for the remainder of the request.
    pub permanent: bool,
    /// Remove the key from the pool globally.
    pub evict_key: bool,
    /// Mark the model's task failed without further attempts.
    pub drop_model: bool,
}

/// Classifies a backend failure by HTTP status code. `None` status (network
/// error, connection reset, etc.) is treated like a 5xx: transient.
pub fn classify(status: Option<u16>) -> Classification {
    match status {
        Some(401) | Some(403) => Classification {
            permanent: true,
            evict_key: true,
            drop_model: false,
        },
        Some(404) => Classification {
            permanent: true,
            evict_key: false,
            drop_model: true,
        },
        Some(429) => transient(),
        Some(s) if s >= 500 => transient(),
        Some(_) => Classification {
            permanent: true,
            evict_key: false,
            drop_model: true,
        },
        None => transient(),
    }
}

fn transient() -> Classification {
    Classification {
        permanent: false,
        evict_key: false,
        drop_model: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_evict_key() {
        for status in [401, 403] {
            let c = classify(Some(status));
            assert!(c.permanent);
            assert!(c.evict_key);
            assert!(!c.drop_model);
        }
    }

    #[test]
    fn test_not_found_drops_model() {
        let c = classify(Some(404));
        assert!(c.permanent);
        assert!(!c.evict_key);
        assert!(c.drop_model);
    }

    #[test]
    fn test_other_4xx_drops_model() {
        let c = classify(Some(422));
        assert!(c.permanent);
        assert!(c.drop_model);
        assert!(!c.evict_key);
    }

    #[test]
    fn test_rate_limit_and_5xx_are_transient() {
        for status in [429, 500, 502, 503] {
            let c = classify(Some(status));
            assert!(!c.permanent);
            assert!(!c.evict_key);
            assert!(!c.drop_model);
        }
    }

    #[test]
    fn test_network_error_is_transient() {
        let c = classify(None);
        assert!(!c.permanent);
    }
}
