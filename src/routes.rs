use crate::models::Role;
use std::fmt;
use uuid::Uuid;

/// Every view the application can show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Auth { role: Option<Role> },
    Beekeeper,
    Landowner,
    Admin,
    LandDetail { id: Uuid },
    Account,
    NotFound { path: String },
}

impl Route {
    /// Resolve a path (with optional query string) to a view
    pub fn parse(path: &str) -> Route {
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path, None),
        };
        let trimmed = path.trim_end_matches('/');

        match trimmed {
            "" => Route::Home,
            "/auth" => Route::Auth {
                role: query.and_then(role_from_query),
            },
            "/beekeeper" => Route::Beekeeper,
            "/landowner" => Route::Landowner,
            "/admin" => Route::Admin,
            "/account" => Route::Account,
            other => match other.strip_prefix("/land/").map(Uuid::parse_str) {
                Some(Ok(id)) => Route::LandDetail { id },
                _ => Route::NotFound {
                    path: path.to_string(),
                },
            },
        }
    }

    /// Landing page for a signed-in user of the given role
    pub fn dashboard(role: Role) -> Route {
        match role {
            Role::Beekeeper => Route::Beekeeper,
            Role::Landowner => Route::Landowner,
            Role::Admin => Route::Admin,
        }
    }

    pub fn sign_in_as(role: Role) -> Route {
        Route::Auth { role: Some(role) }
    }

    /// Entry points offered on the home page, one per self-registering role
    pub fn entry_points() -> [(Role, Route); 2] {
        [Role::Beekeeper, Role::Landowner].map(|role| (role, Route::sign_in_as(role)))
    }
}

fn role_from_query(query: &str) -> Option<Role> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "role")
        .and_then(|(_, value)| value.parse().ok())
        .filter(|role| *role != Role::Admin)
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => f.write_str("/"),
            Route::Auth { role: Some(role) } => write!(f, "/auth?role={}", role),
            Route::Auth { role: None } => f.write_str("/auth"),
            Route::Beekeeper => f.write_str("/beekeeper"),
            Route::Landowner => f.write_str("/landowner"),
            Route::Admin => f.write_str("/admin"),
            Route::LandDetail { id } => write!(f, "/land/{}", id),
            Route::Account => f.write_str("/account"),
            Route::NotFound { path } => f.write_str(path),
        }
    }
}
