//! REST client tests against an in-process fake PostgREST server

#[cfg(test)]
mod tests {
    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
    use chrono::{TimeZone, Utc};
    use inout_core::{
        config::ExternalConfig,
        models::{DateRange, ProjectCredentials},
        traits::{ChatHistorySource, ExternalProject, LeadSource, SortOrder},
        AppError,
    };
    use inout_external::RestClientFactory;
    use serde_json::{json, Value};

    const KEY: &str = "test-anon-key";

    type Query = web::Query<Vec<(String, String)>>;

    fn param<'a>(query: &'a Query, key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn authorized(req: &HttpRequest) -> bool {
        let apikey = req.headers().get("apikey").and_then(|v| v.to_str().ok());
        let bearer = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok());
        apikey == Some(KEY) && bearer == Some("Bearer test-anon-key")
    }

    fn unauthorized() -> HttpResponse {
        HttpResponse::Unauthorized().json(json!({"message": "Invalid API key"}))
    }

    async fn leads(req: HttpRequest, query: Query) -> HttpResponse {
        if !authorized(&req) {
            return unauthorized();
        }

        let filters: Vec<&str> = query
            .iter()
            .filter(|(k, _)| k == "created_at")
            .map(|(_, v)| v.as_str())
            .collect();
        if filters.len() != 2 || !filters[0].starts_with("gte.") || !filters[1].starts_with("lte.") {
            return HttpResponse::BadRequest().json(json!({"message": "missing range"}));
        }

        let offset: usize = param(&query, "offset").and_then(|v| v.parse().ok()).unwrap_or(0);
        let limit: usize = param(&query, "limit").and_then(|v| v.parse().ok()).unwrap_or(100);

        let rows: Vec<Value> = (0..5)
            .map(|i| json!({"id": i, "created_at": "2024-06-10T12:00:00Z", "converted": i % 2 == 0}))
            .skip(offset)
            .take(limit)
            .collect();

        HttpResponse::Ok().json(rows)
    }

    async fn probe(req: HttpRequest) -> HttpResponse {
        if !authorized(&req) {
            return unauthorized();
        }
        HttpResponse::NotFound().json(json!({
            "code": "42P01",
            "message": "relation \"public._test_connection_\" does not exist"
        }))
    }

    async fn get_tables(req: HttpRequest) -> HttpResponse {
        if !authorized(&req) {
            return unauthorized();
        }
        HttpResponse::Ok().json(json!([{"table_name": "leads"}, {"table_name": "n8n_chat_histories"}]))
    }

    async fn patch_leads(req: HttpRequest, query: Query, body: web::Json<Value>) -> HttpResponse {
        if !authorized(&req) {
            return unauthorized();
        }
        let prefer = req.headers().get("prefer").and_then(|v| v.to_str().ok());
        if prefer != Some("return=representation") || body.get("agent_on") != Some(&json!(false)) {
            return HttpResponse::BadRequest().finish();
        }
        match param(&query, "cliente_id") {
            Some("eq.5511999990000") => {
                HttpResponse::Ok().json(json!([{"cliente_id": "5511999990000"}]))
            }
            _ => HttpResponse::Ok().json(json!([])),
        }
    }

    async fn chat(req: HttpRequest, query: Query) -> HttpResponse {
        if !authorized(&req) {
            return unauthorized();
        }
        if param(&query, "session_id").is_some() {
            return HttpResponse::Ok().json(json!([
                {"id": 1, "session_id": "a", "message": {"type": "human", "content": "oi"}, "created_at": "2024-06-10T12:00:00Z"},
                {"id": 2, "session_id": "a", "message": "tudo bem?", "created_at": "2024-06-10T12:01:00Z"}
            ]));
        }
        HttpResponse::Ok().json(json!([
            {"session_id": "b"}, {"session_id": "a"}, {"session_id": "b"}, {"session_id": null}
        ]))
    }

    async fn spawn_server() -> String {
        let server = HttpServer::new(|| {
            App::new()
                .route("/rest/v1/leads", web::get().to(leads))
                .route("/rest/v1/leads_metricas", web::patch().to(patch_leads))
                .route("/rest/v1/_test_connection_", web::get().to(probe))
                .route("/rest/v1/n8n_chat_histories", web::get().to(chat))
                .route("/rest/v1/rpc/get_tables", web::post().to(get_tables))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        actix_rt::spawn(server.run());
        format!("http://{}", addr)
    }

    fn factory(page_size: usize) -> RestClientFactory {
        RestClientFactory::new(&ExternalConfig {
            request_timeout_secs: 5,
            page_size,
            ..ExternalConfig::default()
        })
        .unwrap()
    }

    fn credentials(url: &str, key: &str) -> ProjectCredentials {
        ProjectCredentials {
            project_url: url.to_string(),
            anon_key: key.to_string(),
        }
    }

    fn range() -> DateRange {
        DateRange {
            start: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap(),
        }
    }

    #[actix_rt::test]
    async fn test_fetch_leads_reads_every_page() {
        let url = spawn_server().await;
        let client = factory(2).client(&credentials(&url, KEY));

        let rows = client
            .fetch_leads("leads", &range(), SortOrder::Descending, 100)
            .await
            .unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4]["id"], json!(4));
    }

    #[actix_rt::test]
    async fn test_fetch_leads_respects_row_cap() {
        let url = spawn_server().await;
        let client = factory(2).client(&credentials(&url, KEY));

        let rows = client
            .fetch_leads("leads", &range(), SortOrder::Ascending, 3)
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[actix_rt::test]
    async fn test_connection_probe() {
        let url = spawn_server().await;

        let ok = factory(10).client(&credentials(&url, KEY));
        assert!(ok.test_connection().await.is_ok());

        let bad_key = factory(10).client(&credentials(&url, "wrong"));
        let err = bad_key.test_connection().await.unwrap_err();
        assert!(matches!(err, AppError::ExternalQuery(ref m) if m == "Invalid API key"));
    }

    #[actix_rt::test]
    async fn test_unreachable_project_is_connection_error() {
        let client = factory(10).client(&credentials("http://127.0.0.1:9", KEY));
        let err = client.test_connection().await.unwrap_err();
        assert!(err.is_connectivity());
        assert!(matches!(err, AppError::ExternalConnection(_)));
    }

    #[actix_rt::test]
    async fn test_list_tables() {
        let url = spawn_server().await;
        let client = factory(10).client(&credentials(&url, KEY));
        assert_eq!(
            client.list_tables().await.unwrap(),
            vec!["leads", "n8n_chat_histories"]
        );
    }

    #[actix_rt::test]
    async fn test_disable_agent_counts_changed_rows() {
        let url = spawn_server().await;
        let client = factory(10).client(&credentials(&url, KEY));

        assert_eq!(
            client.disable_agent("leads_metricas", "5511999990000").await.unwrap(),
            1
        );
        assert_eq!(client.disable_agent("leads_metricas", "000").await.unwrap(), 0);
    }

    #[actix_rt::test]
    async fn test_chat_history() {
        let url = spawn_server().await;
        let client = factory(10).client(&credentials(&url, KEY));

        let ids = client
            .recent_session_ids("n8n_chat_histories", None, 2000)
            .await
            .unwrap();
        assert_eq!(ids, vec!["b", "a", "b"]);

        let messages = client
            .session_messages("n8n_chat_histories", "a", Some(&range()))
            .await
            .unwrap();
        let texts: Vec<String> = messages.iter().map(|m| m.content_text()).collect();
        assert_eq!(texts, vec!["oi", "tudo bem?"]);
    }
}
