use super::*;
use serial_test::serial;
use tempfile::TempDir;

#[test]
#[serial]
fn config_dir_honours_home_override() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");

    // SAFETY: serialized with the other env-touching tests
    unsafe {
        std::env::set_var(settings::HOME_ENV_VAR, temp_dir.path());
    }
    let dir = get_config_dir();
    unsafe {
        std::env::remove_var(settings::HOME_ENV_VAR);
    }

    assert_eq!(dir.expect("config dir should resolve"), temp_dir.path());
}

#[test]
fn invalid_toml_handling() {
    let invalid_toml = r#"
        [ollama
        host = "localhost"
        port = "invalid_port"
    "#;

    let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
    assert!(result.is_err());
}

#[test]
fn wrong_field_type_is_rejected() {
    let result: Result<Config, toml::de::Error> = toml::from_str(
        r#"
        [server]
        port = "three thousand"
        "#,
    );
    assert!(result.is_err());
}

#[test]
fn complete_valid_config() {
    let valid_toml = r#"
        [server]
        host = "127.0.0.1"
        port = 8080
        base_path = "/rag"
        log_level = "warn"

        [ollama]
        protocol = "http"
        host = "localhost"
        port = 11434
        embedding_model = "all-minilm"
        chat_model = "llama3.2:latest"
        batch_size = 64
        temperature = 0.2

        [vector_store]
        collection_name = "docs"
        distance = "cosine"
        max_documents_to_retrieve = 6
        max_score_distance = 0.5

        [chunking]
        chunk_size = 800
        chunk_overlap = 80

        [crawler]
        user_agent = "test-agent"
        timeout_seconds = 5
        rate_limit_ms = 0
        max_pages = 10

        [chat]
        max_query_length = 500
    "#;

    let config: Config = toml::from_str(valid_toml).expect("should parse toml correctly");
    assert!(config.validate().is_ok());
    assert_eq!(config.server.base_path, "/rag");
    assert_eq!(config.embedding_dimension(), 384);
    assert_eq!(config.vector_store.max_score_distance, Some(0.5));
    assert_eq!(config.crawler.max_pages, Some(10));
    assert_eq!(config.chat.max_query_length, 500);
}
