//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Mutex;
use zdk_openapi_executor::{HttpResponse, HttpTransport, RequestDescriptor, Result};

/// Transport that records every request and answers `200 {"ok": true}`.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<RequestDescriptor>>,
}

impl RecordingTransport {
    pub fn recorded(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        Ok(HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: Default::default(),
            data: json!({ "ok": true }),
        })
    }
}

/// Events API used across the integration tests.
pub fn events_spec(server_url: &str) -> Value {
    json!({
        "openapi": "3.0.3",
        "info": { "title": "Events API", "version": "1.0.0" },
        "servers": [{ "url": server_url }],
        "security": [{ "bearer": [] }],
        "paths": {
            "/example/api/path": {
                "get": {
                    "operationId": "keyedOperation",
                    "security": [{ "apiKey": [] }]
                }
            },
            "/events/{eventId}": {
                "parameters": [
                    { "name": "eventId", "in": "path", "required": true, "schema": { "type": "string" } }
                ],
                "get": {
                    "operationId": "getEvent",
                    "parameters": [
                        { "name": "expand", "in": "query", "schema": { "type": "boolean" } },
                        { "name": "X-Request-Id", "in": "header" },
                        { "name": "Accept", "in": "header" }
                    ]
                },
                "put": {
                    "operationId": "updateEvent",
                    "security": [],
                    "requestBody": {
                        "content": {
                            "application/json": { "schema": { "$ref": "#/components/schemas/Event" } }
                        }
                    }
                }
            },
            "/events": {
                "post": {
                    "operationId": "createEvent",
                    "security": [{ "basic": [] }, { "oAuth": ["write:events"] }],
                    "requestBody": {
                        "content": {
                            "application/x-www-form-urlencoded": {}
                        }
                    }
                }
            },
            "/session": {
                "get": {
                    "operationId": "getSession",
                    "parameters": [{ "name": "sid", "in": "cookie" }],
                    "security": [{}]
                }
            }
        },
        "components": {
            "schemas": {
                "Event": {
                    "type": "object",
                    "properties": { "name": { "type": "string" } }
                }
            },
            "securitySchemes": {
                "apiKey": { "type": "apiKey", "in": "query", "name": "apikey" },
                "bearer": { "type": "http", "scheme": "bearer" },
                "basic": { "type": "http", "scheme": "basic" },
                "oAuth": {
                    "type": "oauth2",
                    "flows": {
                        "authorizationCode": {
                            "authorizationUrl": format!("{server_url}/oauth/authorize"),
                            "tokenUrl": format!("{server_url}/oauth/token"),
                            "scopes": {
                                "read:events": "Read events",
                                "write:events": "Write events"
                            }
                        },
                        "clientCredentials": {
                            "tokenUrl": format!("{server_url}/oauth/token"),
                            "scopes": {}
                        }
                    }
                }
            }
        }
    })
}
