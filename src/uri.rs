//! Resource URIs.
//!
//! The local model addresses every resource by a fully qualified
//! `{workspace}/{application}[/src/{module}[/{service}[/tests/{test}]]]`
//! path. Decomposition is a pure function of the path segments — the four
//! shapes never overlap, so parsing is deterministic. The remote API
//! addresses resources relative to the workspace, so identifiers sent in
//! URL path segments are first stripped of the leading workspace segment.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UriError {
    #[error("empty resource uri")]
    Empty,
    #[error("resource uri has an empty segment: {0}")]
    EmptySegment(String),
    #[error("unrecognized resource uri shape: {0}")]
    Shape(String),
}

/// What a decomposed URI addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Application,
    Module,
    Service,
    Test,
}

/// A decomposed resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUri {
    pub workspace: String,
    pub application: String,
    pub module: Option<String>,
    pub service: Option<String>,
    pub test: Option<String>,
}

impl ResourceUri {
    /// Decompose a fully qualified resource path.
    ///
    /// Accepted shapes:
    /// - `ws/app`
    /// - `ws/app/src/module`
    /// - `ws/app/src/module/service`
    /// - `ws/app/src/module/service/tests/test.json`
    pub fn parse(uri: &str) -> Result<Self, UriError> {
        let trimmed = uri.trim_matches('/');
        if trimmed.is_empty() {
            return Err(UriError::Empty);
        }
        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(UriError::EmptySegment(uri.to_string()));
        }

        let shape_err = || UriError::Shape(uri.to_string());
        match segments.as_slice() {
            [ws, app] => Ok(Self {
                workspace: ws.to_string(),
                application: app.to_string(),
                module: None,
                service: None,
                test: None,
            }),
            [ws, app, "src", module] => Ok(Self {
                workspace: ws.to_string(),
                application: app.to_string(),
                module: Some(module.to_string()),
                service: None,
                test: None,
            }),
            [ws, app, "src", module, service] => Ok(Self {
                workspace: ws.to_string(),
                application: app.to_string(),
                module: Some(module.to_string()),
                service: Some(service.to_string()),
                test: None,
            }),
            [ws, app, "src", module, service, "tests", test] => Ok(Self {
                workspace: ws.to_string(),
                application: app.to_string(),
                module: Some(module.to_string()),
                service: Some(service.to_string()),
                test: Some(test.to_string()),
            }),
            _ => Err(shape_err()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        if self.test.is_some() {
            ResourceKind::Test
        } else if self.service.is_some() {
            ResourceKind::Service
        } else if self.module.is_some() {
            ResourceKind::Module
        } else {
            ResourceKind::Application
        }
    }

    // ─── Derivations ──────────────────────────────────────────────────────────

    pub fn application_uri(&self) -> String {
        format!("{}/{}", self.workspace, self.application)
    }

    pub fn module_uri(&self) -> Option<String> {
        self.module
            .as_ref()
            .map(|m| format!("{}/{}/src/{}", self.workspace, self.application, m))
    }

    pub fn service_uri(&self) -> Option<String> {
        match (&self.module, &self.service) {
            (Some(m), Some(s)) => Some(format!(
                "{}/{}/src/{}/{}",
                self.workspace, self.application, m, s
            )),
            _ => None,
        }
    }

    /// The application's data-source definition URI.
    pub fn data_source_uri(&self) -> String {
        format!(
            "{}/{}/src/datasource.json",
            self.workspace, self.application
        )
    }
}

impl std::fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.module, &self.service, &self.test) {
            (None, _, _) => write!(f, "{}", self.application_uri()),
            (Some(m), None, _) => {
                write!(f, "{}/{}/src/{}", self.workspace, self.application, m)
            }
            (Some(m), Some(s), None) => {
                write!(f, "{}/{}/src/{}/{}", self.workspace, self.application, m, s)
            }
            (Some(m), Some(s), Some(t)) => write!(
                f,
                "{}/{}/src/{}/{}/tests/{}",
                self.workspace, self.application, m, s, t
            ),
        }
    }
}

/// Drop the leading workspace segment of a fully qualified URI.
///
/// The remote API addresses resources relative to the workspace.
pub fn strip_workspace(uri: &str) -> &str {
    let trimmed = uri.trim_start_matches('/');
    match trimmed.find('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_shapes_decompose_unambiguously() {
        let app = ResourceUri::parse("ws/app").unwrap();
        assert_eq!(app.kind(), ResourceKind::Application);

        let module = ResourceUri::parse("ws/app/src/m1").unwrap();
        assert_eq!(module.kind(), ResourceKind::Module);
        assert_eq!(module.module.as_deref(), Some("m1"));

        let service = ResourceUri::parse("ws/app/src/m1/orders").unwrap();
        assert_eq!(service.kind(), ResourceKind::Service);
        assert_eq!(service.service.as_deref(), Some("orders"));

        let test = ResourceUri::parse("ws/app/src/m1/orders/tests/smoke.json").unwrap();
        assert_eq!(test.kind(), ResourceKind::Test);
        assert_eq!(test.test.as_deref(), Some("smoke.json"));
    }

    #[test]
    fn derivations_are_deterministic() {
        let uri = ResourceUri::parse("ws/app/src/m1/orders").unwrap();
        assert_eq!(uri.application_uri(), "ws/app");
        assert_eq!(uri.module_uri().unwrap(), "ws/app/src/m1");
        assert_eq!(uri.service_uri().unwrap(), "ws/app/src/m1/orders");
        assert_eq!(uri.data_source_uri(), "ws/app/src/datasource.json");
    }

    #[test]
    fn parse_display_round_trips() {
        for raw in [
            "ws/app",
            "ws/app/src/m1",
            "ws/app/src/m1/orders",
            "ws/app/src/m1/orders/tests/smoke.json",
        ] {
            assert_eq!(ResourceUri::parse(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn malformed_shapes_are_rejected() {
        assert_eq!(ResourceUri::parse(""), Err(UriError::Empty));
        assert!(matches!(
            ResourceUri::parse("ws"),
            Err(UriError::Shape(_))
        ));
        // three segments is not a valid shape — the src marker is mandatory
        assert!(matches!(
            ResourceUri::parse("ws/app/m1"),
            Err(UriError::Shape(_))
        ));
        // a test path without the tests marker is not a test
        assert!(matches!(
            ResourceUri::parse("ws/app/src/m1/orders/smoke.json/x"),
            Err(UriError::Shape(_))
        ));
        assert!(matches!(
            ResourceUri::parse("ws//src/m1"),
            Err(UriError::EmptySegment(_))
        ));
    }

    #[test]
    fn strip_workspace_drops_first_segment() {
        assert_eq!(strip_workspace("ws/app/src/m1"), "app/src/m1");
        assert_eq!(strip_workspace("ws"), "ws");
        assert_eq!(strip_workspace("/ws/app"), "app");
    }
}
