//! Static table of every vendor endpoint exposed by the proxy.

use crate::forwarder::VendorApi;
use axum::routing::MethodFilter;

/// How a vendor status code is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseEntry {
    /// Send the vendor's JSON body as-is.
    PassThrough,
    /// Send a fixed message instead of the vendor's body.
    Message(&'static str),
}

/// Which credential is placed in the `AccessKey` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    Account,
    /// Resolved per request from the `libraryId` path parameter.
    Library,
}

/// HTTP method of a table entry.
///
/// [`axum::http::Method`] cannot be built in a `static`, so the table uses this
/// and converts to a [`MethodFilter`] when the router is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Delete,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Delete => "DELETE",
        }
    }

    pub fn filter(self) -> MethodFilter {
        match self {
            Verb::Get => MethodFilter::GET,
            Verb::Post => MethodFilter::POST,
            Verb::Delete => MethodFilter::DELETE,
        }
    }
}

#[derive(Debug)]
pub struct RouteSpec {
    /// Local path, using `{param}` captures.
    pub path: &'static str,
    pub methods: &'static [Verb],
    pub description: &'static str,
    pub api: VendorApi,
    /// Vendor path relative to the API base, using the same captures as `path`.
    pub upstream: &'static str,
    pub credential: Credential,
    pub responses: &'static [(u16, ResponseEntry)],
}

impl RouteSpec {
    pub fn response_for(&self, status: u16) -> Option<ResponseEntry> {
        self.responses
            .iter()
            .find(|(code, _)| *code == status)
            .map(|(_, entry)| *entry)
    }

    pub fn has_captures(&self) -> bool {
        self.path.contains('{')
    }

    pub fn method_filter(&self) -> Option<MethodFilter> {
        self.methods
            .iter()
            .map(|verb| verb.filter())
            .reduce(MethodFilter::or)
    }
}

use ResponseEntry::{Message, PassThrough as DATA};

const AUTH_FAILED: ResponseEntry = Message("The request authorization failed");
const FORBIDDEN: ResponseEntry = Message("Forbidden");
const SERVER_ERROR: ResponseEntry = Message("Internal Server Error");
const LIBRARY_MISSING: ResponseEntry =
    Message("A Video Library with the requested ID does not exist");
const STORAGE_ZONE_MISSING: ResponseEntry = Message("The requested storage zone does not exist");
const COLLECTION_MISSING: ResponseEntry = Message("The requested collection does not exist");
const VIDEO_MISSING: ResponseEntry = Message("The requested video was not found");

const BASIC: &[(u16, ResponseEntry)] = &[(200, DATA), (401, AUTH_FAILED), (500, SERVER_ERROR)];
const ACCOUNT_READ: &[(u16, ResponseEntry)] = &[
    (200, DATA),
    (401, AUTH_FAILED),
    (403, FORBIDDEN),
    (500, SERVER_ERROR),
];
const VIDEO_LIBRARIES: &[(u16, ResponseEntry)] = &[
    (200, DATA),
    (201, DATA),
    (202, DATA),
    (203, DATA),
    (204, DATA),
    (401, AUTH_FAILED),
    (403, FORBIDDEN),
    (500, SERVER_ERROR),
];
const VIDEO_LIBRARY: &[(u16, ResponseEntry)] = &[
    (200, DATA),
    (201, DATA),
    (202, DATA),
    (203, DATA),
    (204, DATA),
    (401, AUTH_FAILED),
    (404, LIBRARY_MISSING),
    (500, SERVER_ERROR),
];
const STORAGE_ZONE_WRITE: &[(u16, ResponseEntry)] = &[
    (200, DATA),
    (400, DATA),
    (401, AUTH_FAILED),
    (500, SERVER_ERROR),
];
const STORAGE_ZONE: &[(u16, ResponseEntry)] = &[
    (200, DATA),
    (401, AUTH_FAILED),
    (404, STORAGE_ZONE_MISSING),
    (500, SERVER_ERROR),
];
const STORAGE_ZONE_UPDATE: &[(u16, ResponseEntry)] = &[
    (200, DATA),
    (400, DATA),
    (401, AUTH_FAILED),
    (404, STORAGE_ZONE_MISSING),
    (500, SERVER_ERROR),
];
const COLLECTION: &[(u16, ResponseEntry)] = &[
    (200, DATA),
    (401, AUTH_FAILED),
    (404, COLLECTION_MISSING),
    (500, SERVER_ERROR),
];
const VIDEO: &[(u16, ResponseEntry)] = &[
    (200, DATA),
    (400, DATA),
    (401, AUTH_FAILED),
    (404, VIDEO_MISSING),
    (500, SERVER_ERROR),
];

const fn account(
    path: &'static str,
    methods: &'static [Verb],
    description: &'static str,
    upstream: &'static str,
    responses: &'static [(u16, ResponseEntry)],
) -> RouteSpec {
    RouteSpec {
        path,
        methods,
        description,
        api: VendorApi::Account,
        upstream,
        credential: Credential::Account,
        responses,
    }
}

const fn library(
    path: &'static str,
    methods: &'static [Verb],
    description: &'static str,
    responses: &'static [(u16, ResponseEntry)],
) -> RouteSpec {
    RouteSpec {
        path,
        methods,
        description,
        api: VendorApi::Stream,
        // Stream API paths mirror the local ones.
        upstream: path,
        credential: Credential::Library,
        responses,
    }
}

const GET: &[Verb] = &[Verb::Get];
const POST: &[Verb] = &[Verb::Post];
const DELETE: &[Verb] = &[Verb::Delete];

pub static ROUTES: &[RouteSpec] = &[
    account("/country", GET, "Get Country List", "country", ACCOUNT_READ),
    account("/apikey", GET, "List API Keys", "apikey", ACCOUNT_READ),
    account(
        "/region",
        GET,
        "List Regions",
        "region",
        &[(200, DATA), (500, SERVER_ERROR)],
    ),
    account(
        "/videolibrary",
        GET,
        "List Video Libraries",
        "videolibrary",
        VIDEO_LIBRARIES,
    ),
    account(
        "/videolibrary",
        POST,
        "Add Video Library",
        "videolibrary",
        VIDEO_LIBRARIES,
    ),
    account(
        "/videolibrary/{libraryId}",
        GET,
        "Get Video Library",
        "videolibrary/{libraryId}",
        VIDEO_LIBRARY,
    ),
    account(
        "/videolibrary/{libraryId}",
        POST,
        "Update Video Library",
        "videolibrary/{libraryId}",
        VIDEO_LIBRARY,
    ),
    account(
        "/videolibrary/{libraryId}",
        DELETE,
        "Delete Video Library",
        "videolibrary/{libraryId}",
        VIDEO_LIBRARY,
    ),
    account(
        "/videolibrary/languages",
        GET,
        "Get Languages",
        "videolibrary/languages",
        BASIC,
    ),
    account(
        "/videolibrary/{libraryId}/resetApiKey",
        POST,
        "Reset Video Library API Key",
        "videolibrary/{libraryId}/resetApiKey",
        &[
            (200, DATA),
            (201, DATA),
            (202, DATA),
            (203, DATA),
            (204, DATA),
            (401, AUTH_FAILED),
            (
                404,
                Message("The Video Library with the requested ID does not exist"),
            ),
            (500, SERVER_ERROR),
        ],
    ),
    // GET and POST behave identically on the vendor side.
    account(
        "/purge",
        &[Verb::Get, Verb::Post],
        "Purge URL",
        "purge",
        BASIC,
    ),
    account(
        "/storagezone",
        GET,
        "List Storage Zones",
        "storagezone",
        BASIC,
    ),
    account(
        "/storagezone",
        POST,
        "Add Storage Zone",
        "storagezone",
        STORAGE_ZONE_WRITE,
    ),
    account(
        "/storagezone/checkavailability",
        POST,
        "Check Storage Zone Availability",
        "storagezone/checkavailability",
        STORAGE_ZONE_WRITE,
    ),
    account(
        "/storagezone/{storageZoneId}",
        GET,
        "Get Storage Zone",
        "storagezone/{storageZoneId}",
        STORAGE_ZONE,
    ),
    account(
        "/storagezone/{storageZoneId}",
        POST,
        "Update Storage Zone",
        "storagezone/{storageZoneId}",
        STORAGE_ZONE_UPDATE,
    ),
    account(
        "/storagezone/{storageZoneId}",
        DELETE,
        "Delete Storage Zone",
        "storagezone/{storageZoneId}",
        STORAGE_ZONE,
    ),
    account(
        "/storagezone/{storageZoneId}/statistics",
        GET,
        "Get Storage Zone Statistics",
        "storagezone/{storageZoneId}/statistics",
        STORAGE_ZONE,
    ),
    library(
        "/library/{libraryId}/collections",
        GET,
        "List Collections",
        COLLECTION,
    ),
    library(
        "/library/{libraryId}/collections",
        POST,
        "Create Collection",
        COLLECTION,
    ),
    library(
        "/library/{libraryId}/collections/{collectionId}",
        GET,
        "Get Collection",
        COLLECTION,
    ),
    library(
        "/library/{libraryId}/collections/{collectionId}",
        POST,
        "Update Collection",
        COLLECTION,
    ),
    library(
        "/library/{libraryId}/collections/{collectionId}",
        DELETE,
        "Delete Collection",
        COLLECTION,
    ),
    library("/library/{libraryId}/videos", GET, "List Videos", VIDEO),
    library("/library/{libraryId}/videos", POST, "Create Video", VIDEO),
    library("/library/{libraryId}/videos/fetch", POST, "Fetch Video", VIDEO),
    library(
        "/library/{libraryId}/statistics",
        GET,
        "Get Video Statistics",
        VIDEO,
    ),
    library(
        "/library/{libraryId}/videos/{videoId}",
        GET,
        "Get Video",
        VIDEO,
    ),
    library(
        "/library/{libraryId}/videos/{videoId}",
        POST,
        "Update Video",
        VIDEO,
    ),
    library(
        "/library/{libraryId}/videos/{videoId}",
        DELETE,
        "Delete Video",
        VIDEO,
    ),
    library(
        "/library/{libraryId}/videos/{videoId}/heatmap",
        GET,
        "Get Video Heatmap",
        VIDEO,
    ),
    library(
        "/library/{libraryId}/videos/{videoId}/play",
        GET,
        "Get Video Play Data",
        VIDEO,
    ),
    library(
        "/library/{libraryId}/videos/{videoId}/reencode",
        POST,
        "Reencode Video",
        VIDEO,
    ),
    library(
        "/library/{libraryId}/videos/{videoId}/repackage",
        POST,
        "Repackage Video",
        VIDEO,
    ),
    library(
        "/library/{libraryId}/videos/{videoId}/thumbnail",
        POST,
        "Set Thumbnail",
        VIDEO,
    ),
    library(
        "/library/{libraryId}/videos/{videoId}/captions/{srclang}",
        POST,
        "Add Caption",
        VIDEO,
    ),
    library(
        "/library/{libraryId}/videos/{videoId}/captions/{srclang}",
        DELETE,
        "Delete Caption",
        VIDEO,
    ),
    library(
        "/library/{libraryId}/videos/{videoId}/transcribe",
        POST,
        "Transcribe Video",
        VIDEO,
    ),
    library(
        "/library/{libraryId}/videos/{videoId}/resolutions",
        GET,
        "Video Resolution Info",
        VIDEO,
    ),
    library(
        "/library/{libraryId}/videos/{videoId}/resolutions/cleanup",
        POST,
        "Cleanup Unconfigured Resolutions",
        VIDEO,
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forwarder::LIBRARY_ID_PARAM;
    use std::collections::HashSet;

    #[test]
    fn path_and_method_pairs_are_unique() {
        let mut seen = HashSet::new();
        for route in ROUTES {
            for verb in route.methods {
                assert!(
                    seen.insert((route.path, *verb)),
                    "{} {:?} is declared twice",
                    route.path,
                    verb
                );
            }
        }
    }

    #[test]
    fn every_route_declares_success_and_methods() {
        for route in ROUTES {
            assert!(!route.methods.is_empty(), "{} has no methods", route.path);
            assert_eq!(
                route.response_for(200),
                Some(ResponseEntry::PassThrough),
                "{} does not pass through 200",
                route.path
            );
        }
    }

    #[test]
    fn library_routes_capture_library_id() {
        let capture = format!("{{{LIBRARY_ID_PARAM}}}");
        for route in ROUTES.iter().filter(|r| r.credential == Credential::Library) {
            assert!(route.path.contains(&capture), "{}", route.path);
            assert_eq!(route.api, VendorApi::Stream, "{}", route.path);
        }
    }

    #[test]
    fn upstream_captures_match_path_captures() {
        fn captures(path: &str) -> Vec<&str> {
            path.split('/')
                .filter(|s| s.starts_with('{') && s.ends_with('}'))
                .collect()
        }
        for route in ROUTES {
            assert_eq!(captures(route.path), captures(route.upstream), "{}", route.path);
        }
    }

    #[test]
    fn response_lookup() {
        let zone = ROUTES
            .iter()
            .find(|r| r.path == "/storagezone/{storageZoneId}" && r.methods == POST)
            .unwrap();
        assert_eq!(zone.response_for(400), Some(ResponseEntry::PassThrough));
        assert_eq!(zone.response_for(404), Some(STORAGE_ZONE_MISSING));
        assert_eq!(zone.response_for(418), None);
    }

    #[test]
    fn purge_accepts_get_and_post() {
        let purge = ROUTES.iter().find(|r| r.path == "/purge").unwrap();
        assert_eq!(
            purge.method_filter(),
            Some(MethodFilter::GET.or(MethodFilter::POST))
        );
    }
}
