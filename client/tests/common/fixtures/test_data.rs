//! Common test data

use serde_json::{json, Value};

pub const USER_ID: &str = "Administrator";
pub const PASSWORD: &str = "Administrator";
pub const DEVICE_ID: &str = "test-device-1";
pub const CLIENT_VERSION: &str = "2.1.0";

/// Basic auth value for USER_ID:PASSWORD
pub const BASIC_AUTH: &str = "Basic QWRtaW5pc3RyYXRvcjpBZG1pbmlzdHJhdG9y";

/// Automation root listing a few operations
pub fn registry_json() -> Value {
    json!({
        "paths": {},
        "operations": [
            {
                "id": "NuxeoDrive.GetRoots",
                "label": "Get Roots",
                "params": []
            },
            {
                "id": "NuxeoDrive.WaitForAsyncCompletion",
                "params": []
            },
            {
                "id": "Document.Create",
                "params": [
                    {"name": "type", "type": "string", "required": true},
                    {"name": "name", "type": "string", "required": false},
                    {"name": "properties", "type": "properties", "required": false}
                ]
            },
            {
                "id": "FileManager.Import",
                "params": [
                    {"name": "overwite", "type": "boolean", "required": false}
                ]
            }
        ],
        "chains": []
    })
}

/// Registry with only the drive roots operation
pub fn roots_only_registry_json() -> Value {
    json!({
        "operations": [
            {"id": "NuxeoDrive.GetRoots", "params": []}
        ]
    })
}
