//! Integration tests for the HTTP API
//!
//! Runs the real routes and services over the in-memory stores.

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};
    use booking_api::{configure_api, json_config, path_config, query_config, AppServices, Stores};
    use booking_auth::JwtService;
    use booking_core::config::SchedulingConfig;
    use booking_core::models::{LeadContactSummary, UserRole};
    use booking_services::test_support::{
        InMemoryAppointments, InMemoryLeads, InMemoryOverrides, InMemoryRules, RecordingNotifier,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use uuid::Uuid;

    struct Harness {
        services: AppServices,
        jwt: web::Data<JwtService>,
        leads: Arc<InMemoryLeads>,
        appointments: Arc<InMemoryAppointments>,
        org: Uuid,
    }

    impl Harness {
        fn new() -> Self {
            let leads = Arc::new(InMemoryLeads::default());
            let appointments = Arc::new(InMemoryAppointments::default());
            let stores = Stores {
                rules: Arc::new(InMemoryRules::default()),
                overrides: Arc::new(InMemoryOverrides::default()),
                appointments: appointments.clone(),
                lead_assigner: leads.clone(),
                lead_directory: leads.clone(),
                notifier: Arc::new(RecordingNotifier::default()),
            };
            let scheduling = SchedulingConfig {
                default_timezone: "UTC".to_string(),
                prevent_double_booking: false,
            };

            Self {
                services: AppServices::build(stores, &scheduling),
                jwt: web::Data::new(JwtService::new("test-secret-key-12345", 3600)),
                leads,
                appointments,
                org: Uuid::new_v4(),
            }
        }

        fn bearer(&self, user_id: Uuid, role: UserRole) -> (&'static str, String) {
            let token = self
                .jwt
                .create_token_for_user(user_id, self.org, role)
                .unwrap();
            ("Authorization", format!("Bearer {}", token))
        }
    }

    macro_rules! init_app {
        ($h:expr) => {
            test::init_service(
                App::new()
                    .app_data($h.jwt.clone())
                    .app_data(query_config())
                    .app_data(json_config())
                    .app_data(path_config())
                    .configure(|cfg| $h.services.register(cfg))
                    .configure(configure_api),
            )
            .await
        };
    }

    fn monday_rule() -> Value {
        json!({
            "weekday": 1,
            "start_time": "09:00",
            "end_time": "12:00",
            "timezone": "UTC",
        })
    }

    #[actix_web::test]
    async fn test_rule_lifecycle_drives_slots() {
        let h = Harness::new();
        let app = init_app!(h);
        let agent = Uuid::new_v4();
        let auth = h.bearer(agent, UserRole::Agent);

        let req = test::TestRequest::post()
            .uri("/api/v1/availability/rules")
            .insert_header(auth.clone())
            .set_json(monday_rule())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["start_time"], "09:00");
        assert_eq!(body["data"]["user_id"], agent.to_string());
        let rule_id = body["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/v1/availability/rules")
            .insert_header(auth.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let slots_uri = format!(
            "/api/v1/availability/slots?user_id={}&start_date=2026-03-02&end_date=2026-03-02",
            agent
        );
        let req = test::TestRequest::get()
            .uri(&slots_uri)
            .insert_header(auth.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"][0]["date"], "2026-03-02");
        assert_eq!(body["data"][0]["slots"].as_array().unwrap().len(), 3);
        assert_eq!(body["data"][0]["slots"][0]["start_time"], "2026-03-02T09:00:00Z");

        let req = test::TestRequest::delete()
            .uri(&format!("/api/v1/availability/rules/{}", rule_id))
            .insert_header(auth.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .uri(&slots_uri)
            .insert_header(auth)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"][0]["slots"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_non_positive_slot_duration_uses_hour_slots() {
        let h = Harness::new();
        let app = init_app!(h);
        let agent = Uuid::new_v4();
        let auth = h.bearer(agent, UserRole::Agent);

        let req = test::TestRequest::post()
            .uri("/api/v1/availability/rules")
            .insert_header(auth.clone())
            .set_json(monday_rule())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        for (duration, expected) in [("0", 3), ("-30", 3), ("30", 6)] {
            let req = test::TestRequest::get()
                .uri(&format!(
                    "/api/v1/availability/slots?user_id={}&start_date=2026-03-02&end_date=2026-03-02&slot_duration={}",
                    agent, duration
                ))
                .insert_header(auth.clone())
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: Value = test::read_body_json(resp).await;
            let slots = body["data"][0]["slots"].as_array().unwrap();
            assert_eq!(slots.len(), expected);
            assert_eq!(slots[0]["start_time"], "2026-03-02T09:00:00Z");
        }

        let req = test::TestRequest::get()
            .uri(&format!(
                "/api/v1/availability/slots?user_id={}&start_date=2026-03-02&end_date=2026-03-02&slot_duration=0",
                agent
            ))
            .insert_header(auth)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"][0]["slots"][0]["end_time"], "2026-03-02T10:00:00Z");
    }

    #[actix_web::test]
    async fn test_unavailable_override_blocks_date() {
        let h = Harness::new();
        let app = init_app!(h);
        let agent = Uuid::new_v4();
        let auth = h.bearer(agent, UserRole::Agent);

        let req = test::TestRequest::post()
            .uri("/api/v1/availability/rules")
            .insert_header(auth.clone())
            .set_json(monday_rule())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/v1/availability/overrides")
            .insert_header(auth.clone())
            .set_json(json!({ "date": "2026-03-02", "is_available": false }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri(&format!(
                "/api/v1/availability/slots?user_id={}&start_date=2026-03-02&end_date=2026-03-09",
                agent
            ))
            .insert_header(auth.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let days = body["data"].as_array().unwrap();
        assert_eq!(days.len(), 8);
        assert!(days[0]["slots"].as_array().unwrap().is_empty());
        assert_eq!(days[7]["slots"].as_array().unwrap().len(), 3);

        let req = test::TestRequest::get()
            .uri("/api/v1/availability/overrides?from=2026-03-01&to=2026-03-31")
            .insert_header(auth)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"][0]["is_available"], false);
    }

    #[actix_web::test]
    async fn test_health_needs_no_token() {
        let h = Harness::new();
        let app = init_app!(h);

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
    }

    #[actix_web::test]
    async fn test_requests_without_token_are_unauthorized() {
        let h = Harness::new();
        let app = init_app!(h);

        let req = test::TestRequest::get().uri("/api/v1/appointments").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "unauthorized");
    }

    #[actix_web::test]
    async fn test_invalid_input_is_rejected() {
        let h = Harness::new();
        let app = init_app!(h);
        let agent = Uuid::new_v4();
        let auth = h.bearer(agent, UserRole::Agent);

        let mut rule = monday_rule();
        rule["weekday"] = json!(9);
        let req = test::TestRequest::post()
            .uri("/api/v1/availability/rules")
            .insert_header(auth.clone())
            .set_json(rule)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "validation_error");

        let req = test::TestRequest::get()
            .uri(&format!(
                "/api/v1/availability/slots?user_id={}&start_date=2026-03-01&end_date=2026-03-16",
                agent
            ))
            .insert_header(auth.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "range_too_large");

        let req = test::TestRequest::get()
            .uri(&format!(
                "/api/v1/availability/slots?user_id={}&start_date=2026-13-01&end_date=2026-13-02",
                agent
            ))
            .insert_header(auth)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "invalid_query");
    }

    #[actix_web::test]
    async fn test_agent_cannot_manage_other_agents_rules() {
        let h = Harness::new();
        let app = init_app!(h);

        let mut rule = monday_rule();
        rule["user_id"] = json!(Uuid::new_v4());
        let req = test::TestRequest::post()
            .uri("/api/v1/availability/rules")
            .insert_header(h.bearer(Uuid::new_v4(), UserRole::Agent))
            .set_json(rule.clone())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/api/v1/availability/rules")
            .insert_header(h.bearer(Uuid::new_v4(), UserRole::Admin))
            .set_json(rule)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    #[actix_web::test]
    async fn test_appointment_flow() {
        let h = Harness::new();
        let app = init_app!(h);
        let agent = Uuid::new_v4();
        let auth = h.bearer(agent, UserRole::Agent);
        let lead_id = Uuid::new_v4();
        h.leads.add_lead(lead_id, None);
        h.leads.add_summary(LeadContactSummary {
            lead_id,
            name: "Jan de Vries".to_string(),
            phone: None,
            address: Some("Keizersgracht 1, Amsterdam".to_string()),
        });

        let req = test::TestRequest::post()
            .uri("/api/v1/appointments")
            .insert_header(auth.clone())
            .set_json(json!({
                "type": "lead_visit",
                "lead_id": lead_id,
                "lead_service_id": Uuid::new_v4(),
                "title": "Roof inspection",
                "start_time": "2026-03-02T09:00:00Z",
                "end_time": "2026-03-02T10:00:00Z",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["status"], "scheduled");
        let id = body["data"]["id"].as_str().unwrap().to_string();

        // Booking an unassigned lead claims it
        assert_eq!(h.leads.assigned_agent(lead_id), Some(agent));

        let req = test::TestRequest::get()
            .uri("/api/v1/appointments")
            .insert_header(auth.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"][0]["id"], id);
        assert_eq!(body["data"][0]["type"], "lead_visit");
        assert_eq!(
            body["data"][0]["lead"],
            "Jan de Vries · Keizersgracht 1, Amsterdam"
        );

        let req = test::TestRequest::patch()
            .uri(&format!("/api/v1/appointments/{}/status", id))
            .insert_header(auth.clone())
            .set_json(json!({ "status": "cancelled" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "cancelled");

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/appointments/{}", id))
            .insert_header(h.bearer(Uuid::new_v4(), UserRole::Agent))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/v1/appointments/{}", id))
            .insert_header(auth)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
        assert!(h.appointments.all().is_empty());
    }

    #[actix_web::test]
    async fn test_lead_visit_rules_are_enforced() {
        let h = Harness::new();
        let app = init_app!(h);
        let agent = Uuid::new_v4();
        let auth = h.bearer(agent, UserRole::Agent);
        let lead_id = Uuid::new_v4();
        h.leads.add_lead(lead_id, Some(Uuid::new_v4()));

        let req = test::TestRequest::post()
            .uri("/api/v1/appointments")
            .insert_header(auth.clone())
            .set_json(json!({
                "type": "lead_visit",
                "lead_id": lead_id,
                "title": "Roof inspection",
                "start_time": "2026-03-02T09:00:00Z",
                "end_time": "2026-03-02T10:00:00Z",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/v1/appointments")
            .insert_header(auth)
            .set_json(json!({
                "type": "lead_visit",
                "lead_id": lead_id,
                "lead_service_id": Uuid::new_v4(),
                "title": "Roof inspection",
                "start_time": "2026-03-02T09:00:00Z",
                "end_time": "2026-03-02T10:00:00Z",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(h.appointments.all().is_empty());
    }

    #[actix_web::test]
    async fn test_portal_books_offered_slot_once() {
        let h = Harness::new();
        let app = init_app!(h);
        let agent = Uuid::new_v4();
        let lead_id = Uuid::new_v4();
        h.leads.add_lead(lead_id, Some(agent));

        let req = test::TestRequest::post()
            .uri("/api/v1/availability/rules")
            .insert_header(h.bearer(agent, UserRole::Agent))
            .set_json(monday_rule())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let base = format!("/api/v1/portal/{}/leads/{}", h.org, lead_id);

        let req = test::TestRequest::get()
            .uri(&format!("{}/availability?start_date=2026-03-02&end_date=2026-03-02", base))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"][0]["slots"].as_array().unwrap().len(), 3);

        let visit = json!({
            "lead_service_id": Uuid::new_v4(),
            "start_time": "2026-03-02T10:00:00Z",
            "end_time": "2026-03-02T11:00:00Z",
        });
        let req = test::TestRequest::post()
            .uri(&format!("{}/visits", base))
            .set_json(visit.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["user_id"], agent.to_string());
        assert_eq!(body["data"]["title"], "Visit");

        let req = test::TestRequest::post()
            .uri(&format!("{}/visits", base))
            .set_json(visit)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(h.appointments.all().len(), 1);
    }

    #[actix_web::test]
    async fn test_portal_unassigned_lead_is_not_found() {
        let h = Harness::new();
        let app = init_app!(h);
        let lead_id = Uuid::new_v4();
        h.leads.add_lead(lead_id, None);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/portal/{}/leads/{}/availability", h.org, lead_id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/portal/{}/leads/not-a-uuid/availability", h.org))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
