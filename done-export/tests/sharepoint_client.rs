use done_export::sharepoint::{SharePointClient, SharePointError};
use done_export_core::config::ExportConfig;
use done_export_core::contract::{DocumentStore, FileUpload, ListReader};
use done_export_core::fetch::fetch_rows;
use done_export_core::query::build_query;

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const LIST_PATH: &str = "/sites/Agile/_api/web/lists/GetByTitle(@t)/RenderListDataAsStream";
const UPLOAD_PATH: &str = "/sites/Agile/_api/web/GetFolderByServerRelativePath(decodedurl=@f)/Files/AddUsingPath(decodedurl=@n,overwrite=true)";

fn config() -> ExportConfig {
    ExportConfig {
        list_title: "User Stories".to_string(),
        status_field: "Status".to_string(),
        done_value: "Erledigt".to_string(),
        done_date_field: "DoneDate".to_string(),
        select_fields: vec!["ID".into(), "DoneDate".into()],
        older_than_days: 30,
        target_folder: "/sites/Agile/Shared Documents/Exports".to_string(),
        file_prefix: None,
    }
}

fn client(server: &MockServer) -> SharePointClient {
    SharePointClient::new(format!("{}/sites/Agile", server.uri()), "secret-token", None).unwrap()
}

fn view_xml(request: &Request) -> String {
    let body: Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["parameters"]["RenderOptions"], json!(2));
    body["parameters"]["ViewXml"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn reads_list_with_alias_bearer_and_view_xml() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LIST_PATH))
        .and(query_param("@t", "'User Stories'"))
        .and(header("authorization", "Bearer secret-token"))
        .and(header("accept", "application/json;odata=nometadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Row": [{"ID": "4", "DoneDate": "2024-01-02T03:04:05Z"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let query = build_query(&config(), now);
    let page = client(&server).read_page(&query, None).await.unwrap();

    assert_eq!(page.rows.len(), 1);
    assert_eq!(page.rows[0]["ID"], json!("4"));
    assert_eq!(page.next_page, None);

    let requests = server.received_requests().await.unwrap();
    let xml = view_xml(&requests[0]);
    assert!(xml.contains("<Eq><FieldRef Name='Status' /><Value Type='Text'>Erledigt</Value></Eq>"), "{xml}");
    assert!(xml.contains("2024-04-01T12:00:00.000Z"), "{xml}");
    assert!(xml.contains("<FieldRef Name='DoneDate' Ascending='TRUE' />"), "{xml}");
}

#[tokio::test]
async fn follows_next_href_across_pages() {
    let server = MockServer::start().await;
    // Most specific first: wiremock picks the first matching mock.
    Mock::given(method("POST"))
        .and(path(LIST_PATH))
        .and(query_param("Paged", "TRUE"))
        .and(query_param("p_ID", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Row": [{"ID": "2", "DoneDate": "2023-02-01T00:00Z"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Row": [{"ID": "1", "DoneDate": "2023-01-01T00:00:00Z"}],
            "NextHref": "?Paged=TRUE&p_ID=1"
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let query = build_query(&config(), now);
    let reader = client(&server);
    let rows = fetch_rows(&reader, &query, now).await.unwrap();

    let ids: Vec<_> = rows.iter().map(|r| r.get("ID").unwrap().to_string()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert_eq!(rows[1].get("DoneDate"), Some("2023-02-01T00:00:00.000Z"));
    assert_eq!(rows[0].get("ExportedOnUtc"), Some("2024-05-01T12:00:00.000Z"));
}

#[tokio::test]
async fn uploads_csv_with_overwrite_and_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(query_param("@f", "'/sites/Agile/Shared Documents/Exports'"))
        .and(query_param("@n", "'Kanban_Archive_2024-05-01.csv'"))
        .and(header("content-type", "text/csv; charset=utf-8"))
        .and(header("authorization", "Bearer secret-token"))
        .and(body_string("ID\n1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ServerRelativeUrl": "/sites/Agile/Shared Documents/Exports/Kanban_Archive_2024-05-01.csv"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let published = client(&server)
        .put_file(FileUpload {
            folder: "/sites/Agile/Shared Documents/Exports".to_string(),
            file_name: "Kanban_Archive_2024-05-01.csv".to_string(),
            content: b"ID\n1".to_vec(),
            content_type: "text/csv; charset=utf-8".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(
        published.location,
        "/sites/Agile/Shared Documents/Exports/Kanban_Archive_2024-05-01.csv"
    );
    assert_eq!(published.bytes, 4);
}

#[tokio::test]
async fn error_status_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LIST_PATH))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("Column 'DoneDate' does not exist."),
        )
        .mount(&server)
        .await;

    let query = build_query(&config(), Utc::now());
    let err = client(&server)
        .render_list_data(&query, None)
        .await
        .unwrap_err();

    match &err {
        SharePointError::Status { status, body, .. } => {
            assert_eq!(status.as_u16(), 400);
            assert!(body.contains("does not exist"));
        }
        other => panic!("expected a status error, got {other:?}"),
    }
    assert!(err.to_string().contains("Column 'DoneDate' does not exist."));
}
