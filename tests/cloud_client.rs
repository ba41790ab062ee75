// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the cloud backend client using wiremock.

#![cfg(feature = "cloud")]

use eightbridge::backend::{BackendApi, CloudClient, CloudConfig};
use eightbridge::error::BackendError;
use eightbridge::manager::StateManager;
use eightbridge::types::{Level, PowerState, Side};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> CloudClient {
    CloudConfig::new("test-token")
        .with_base_url(server.uri())
        .into_client()
        .unwrap()
}

async fn mount_device(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/devices/pod-1"))
        .and(query_param("filter", "leftUserId,rightUserId,awaySides"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_temperature(server: &MockServer, user: &str, level: i32, state: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/users/{user}/temperature")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "currentLevel": level,
            "currentState": { "type": state }
        })))
        .mount(server)
        .await;
}

// ============================================================================
// Reads
// ============================================================================

mod reads {
    use super::*;

    #[tokio::test]
    async fn fetch_device_with_users() {
        let server = MockServer::start().await;
        mount_device(
            &server,
            serde_json::json!({
                "result": {
                    "id": "pod-1",
                    "leftUserId": "user-l",
                    "rightUserId": "user-r",
                    "roomTemperature": 21.5,
                    "waterLevel": 80,
                    "priming": { "status": "priming" }
                }
            }),
        )
        .await;

        let device = client_for(&server)
            .fetch_device_with_users("pod-1")
            .await
            .unwrap();

        assert_eq!(device.id, "pod-1");
        assert_eq!(device.user_id(Side::Left), Some("user-l"));
        assert_eq!(device.user_id(Side::Right), Some("user-r"));
        assert!((device.room_temperature - 21.5).abs() < f64::EPSILON);
        assert!(device.has_water());
        assert!(device.is_priming);
        assert!(!device.needs_priming);
    }

    #[tokio::test]
    async fn null_fields_read_as_unassigned() {
        let server = MockServer::start().await;
        mount_device(
            &server,
            serde_json::json!({
                "result": {
                    "id": "pod-1",
                    "leftUserId": "user-l",
                    "rightUserId": null,
                    "roomTemperature": null,
                    "waterLevel": null,
                    "priming": null
                }
            }),
        )
        .await;

        let device = client_for(&server)
            .fetch_device_with_users("pod-1")
            .await
            .unwrap();

        assert_eq!(device.user_id(Side::Left), Some("user-l"));
        assert_eq!(device.user_id(Side::Right), None);
        assert!(!device.has_water());
        assert!(!device.is_priming);
    }

    #[tokio::test]
    async fn fetch_user_temperature() {
        let server = MockServer::start().await;
        mount_temperature(&server, "user-l", -20, "smart").await;

        let temperature = client_for(&server)
            .fetch_user_temperature("user-l")
            .await
            .unwrap();

        assert_eq!(temperature.current_level, -20);
        assert_eq!(temperature.current_state, PowerState::Smart);
    }

    #[tokio::test]
    async fn power_state_ignores_case() {
        let server = MockServer::start().await;
        mount_temperature(&server, "user-l", 10, "Smart").await;

        let temperature = client_for(&server)
            .fetch_user_temperature("user-l")
            .await
            .unwrap();

        assert_eq!(temperature.current_state, PowerState::Smart);
    }

    #[tokio::test]
    async fn unknown_power_state_is_off() {
        let server = MockServer::start().await;
        mount_temperature(&server, "user-l", 10, "paused").await;

        let temperature = client_for(&server)
            .fetch_user_temperature("user-l")
            .await
            .unwrap();

        assert_eq!(temperature.current_state, PowerState::Off);
    }
}

// ============================================================================
// Mutations
// ============================================================================

mod mutations {
    use super::*;

    #[tokio::test]
    async fn set_user_temperature_puts_level() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/users/user-l/temperature"))
            .and(body_json(serde_json::json!({ "currentLevel": -35 })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .set_user_temperature("user-l", Level::new(-35).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn set_user_power_posts_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/user-r/devices/power"))
            .and(body_json(serde_json::json!({ "on": false })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .set_user_power("user-r", false)
            .await
            .unwrap();
    }
}

// ============================================================================
// Errors
// ============================================================================

mod errors {
    use super::*;

    #[tokio::test]
    async fn non_success_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/devices/pod-1"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_device_with_users("pod-1")
            .await
            .unwrap_err();

        match err {
            BackendError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "token expired");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/user-l/temperature"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_user_temperature("user-l")
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn server_errors_are_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/devices/pod-1"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_device_with_users("pod-1")
            .await
            .unwrap_err();

        assert!(err.is_retryable());
    }
}

// ============================================================================
// StateManager over CloudClient
// ============================================================================

mod manager_scenarios {
    use super::*;

    #[tokio::test]
    async fn two_occupied_sides() {
        let server = MockServer::start().await;
        mount_device(
            &server,
            serde_json::json!({
                "result": {
                    "id": "pod-1",
                    "leftUserId": "user-l",
                    "rightUserId": "user-r",
                    "roomTemperature": 20.0,
                    "waterLevel": 100
                }
            }),
        )
        .await;
        mount_temperature(&server, "user-l", -20, "smart").await;
        mount_temperature(&server, "user-r", 10, "off").await;

        let manager = StateManager::new(client_for(&server), "pod-1");
        let state = manager.get_state().await.unwrap();

        let left = state.user(Side::Left).unwrap();
        assert!(left.is_on());
        assert_eq!(left.target_level(), -20);

        let right = state.user(Side::Right).unwrap();
        assert!(!right.is_on());
        assert_eq!(right.target_level(), 10);
    }

    #[tokio::test]
    async fn unassigned_side_rejects_mutation() {
        let server = MockServer::start().await;
        mount_device(
            &server,
            serde_json::json!({
                "result": { "id": "pod-1", "leftUserId": "user-l" }
            }),
        )
        .await;
        mount_temperature(&server, "user-l", 0, "manual").await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let manager = StateManager::new(client_for(&server), "pod-1");
        let err = manager.turn_on(Side::Right).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(err.to_string(), "no user assigned to right side");
    }

    #[tokio::test]
    async fn null_right_user_leaves_one_side() {
        let server = MockServer::start().await;
        mount_device(
            &server,
            serde_json::json!({
                "result": { "id": "pod-1", "leftUserId": "user-l", "rightUserId": null }
            }),
        )
        .await;
        mount_temperature(&server, "user-l", -10, "smart").await;

        let manager = StateManager::new(client_for(&server), "pod-1");
        let state = manager.get_state().await.unwrap();

        assert_eq!(state.left().map(|user| user.target_level()), Some(-10));
        assert!(state.right().is_none());
    }
}
