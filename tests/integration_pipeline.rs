#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Upload parsing, embedding through a mocked Ollama, LanceDB storage and retrieval

use ragchat::assistant::Assistant;
use ragchat::config::{Config, OllamaConfig};
use ragchat::database::{DistanceMetric, LanceVectorStore, VectorStore};
use ragchat::embeddings::{ChatModel, Embedder, OllamaClient};
use ragchat::indexer::EmbeddingGenerator;
use ragchat::parser::{ParseError, parse_upload};
use serde_json::{Value, json};
use std::io::{Cursor, Write};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Embeds by topic: refunds, shipping, anything else
struct TopicEmbeddings;

impl Respond for TopicEmbeddings {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let embeddings: Vec<Vec<f32>> = body["input"]
            .as_array()
            .map(|inputs| {
                inputs
                    .iter()
                    .map(|input| {
                        let text = input.as_str().unwrap_or_default().to_lowercase();
                        if text.contains("refund") {
                            vec![1.0, 0.0, 0.0]
                        } else if text.contains("ship") {
                            vec![0.0, 1.0, 0.0]
                        } else {
                            vec![0.0, 0.0, 1.0]
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        ResponseTemplate::new(200).set_body_json(json!({ "embeddings": embeddings }))
    }
}

fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in files {
            writer.start_file(*name, options).expect("start file");
            writer.write_all(content).expect("write file");
        }
        writer.finish().expect("finish zip");
    }
    buf
}

async fn mocked_ollama() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(TopicEmbeddings)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "role": "assistant", "content": "Refunds take five days." },
            "done": true
        })))
        .mount(&server)
        .await;
    server
}

fn config_for(server: &MockServer, dir: &TempDir) -> Config {
    let address = server.address();
    let mut config = Config::default();
    config.base_dir = dir.path().to_path_buf();
    config.ollama = OllamaConfig {
        host: address.ip().to_string(),
        port: address.port(),
        batch_size: 2,
        embedding_dimension: Some(3),
        ..OllamaConfig::default()
    };
    config.vector_store.distance = DistanceMetric::Cosine;
    config.vector_store.max_documents_to_retrieve = 1;
    config
}

#[test]
fn archive_with_executable_is_rejected() {
    let bytes = zip_bytes(&[("faq.txt", b"Refunds take five days."), ("tool.exe", b"MZ")]);

    let result = parse_upload("bundle.zip", Some("application/zip"), &bytes);
    assert!(matches!(result, Err(ParseError::InvalidFile(_))));
}

#[test]
fn archive_of_supported_files_yields_one_document_each() {
    let bytes = zip_bytes(&[
        ("faq.txt", b"Refunds take five days."),
        ("shipping.md", b"# Shipping\n\nWe ship **worldwide**."),
    ]);

    let documents =
        parse_upload("bundle.zip", Some("application/zip"), &bytes).expect("zip should parse");
    let origins: Vec<&str> = documents.iter().map(|d| d.origin()).collect();
    assert_eq!(origins, vec!["faq.txt", "shipping.md"]);
    assert_eq!(documents[1].text, "Shipping\nWe ship worldwide.");
}

#[tokio::test(flavor = "multi_thread")]
async fn uploaded_documents_are_retrievable() {
    let ollama = mocked_ollama().await;
    let dir = TempDir::new().expect("tempdir");
    let config = config_for(&ollama, &dir);

    let client = Arc::new(OllamaClient::new(&config.ollama).expect("client"));
    let store: Arc<dyn VectorStore> = Arc::new(
        LanceVectorStore::open(&config)
            .await
            .expect("vector store should open"),
    );
    let generator = EmbeddingGenerator::from_config(
        &config,
        Arc::clone(&client) as Arc<dyn Embedder>,
        Arc::clone(&store),
    );

    let bytes = zip_bytes(&[
        ("faq.txt", b"Refunds take five days."),
        ("shipping.md", b"# Shipping\n\nWe ship worldwide."),
        ("about.txt", b"We are a small team."),
    ]);
    let documents =
        parse_upload("bundle.zip", Some("application/zip"), &bytes).expect("zip should parse");

    let stats = generator
        .generate_from_documents(documents)
        .await
        .expect("generation should succeed");
    assert_eq!(stats.documents, 3);
    assert_eq!(stats.chunks, 3);
    assert_eq!(stats.failed_documents, 0);
    assert_eq!(
        store
            .count(&config.vector_store.collection_name)
            .await
            .expect("count"),
        3
    );

    let assistant = Assistant::from_config(
        &config,
        Arc::clone(&client) as Arc<dyn Embedder>,
        client as Arc<dyn ChatModel>,
        store,
    );
    let completion = assistant
        .complete("How long do refunds take?", &[])
        .await
        .expect("completion should succeed");

    assert_eq!(completion.message, "Refunds take five days.");
    assert_eq!(completion.references.len(), 1);
    assert_eq!(completion.references[0].content, "Refunds take five days.");
    assert_eq!(completion.references[0].url, None);
}
