// tests/orchestrator_test.rs
// End-to-end pipeline tests: classify -> score -> rewrite -> persist -> enrich,
// run against an in-memory SQLite store and a credential-less LLM provider.

use promptbrain::config::EngineConfig;
use promptbrain::history::Repository;
use promptbrain::{Orchestrator, Prompt};

mod common;

async fn test_repository() -> Repository {
    Repository::connect("sqlite::memory:", 1, 50)
        .await
        .expect("in-memory repository should connect and migrate")
}

#[tokio::test]
async fn empty_prompt_returns_input_error_shape() {
    let config = EngineConfig::from_env();
    let orchestrator = Orchestrator::new(common::unconfigured_provider(), None, config);

    let result = orchestrator.analyze(Prompt::new("   "), None).await;

    assert!(result.variants.is_empty());
    assert_eq!(result.issues.len(), 1);
    assert!(!result.persisted);
}

#[tokio::test]
async fn normal_prompt_produces_three_or_four_variants_and_persists() {
    let config = EngineConfig::from_env();
    let repository = test_repository().await;
    let orchestrator = Orchestrator::new(common::unconfigured_provider(), Some(repository), config);

    let prompt = Prompt::new("fix the login bug").with_project_path("/repo/demo");
    let result = orchestrator.analyze(prompt, None).await;

    assert!(result.variants.len() == 3 || result.variants.len() == 4);
    assert!(result.persisted);
    assert!(result.warnings.is_empty());
}

#[tokio::test]
async fn second_analysis_in_same_project_gets_recommendations() {
    let config = EngineConfig::from_env();
    let repository = test_repository().await;
    let orchestrator = Orchestrator::new(common::unconfigured_provider(), Some(repository), config);

    let first = Prompt::new("fix bug").with_project_path("/repo/demo");
    orchestrator.analyze(first, None).await;

    let second = Prompt::new("fix another bug").with_project_path("/repo/demo");
    let result = orchestrator.analyze(second, None).await;

    let enrichment = result.enrichment.expect("second analysis should carry project history");
    assert!(enrichment.comparison.is_some());
}

#[tokio::test]
async fn rich_prompt_scores_higher_than_vague_prompt() {
    let config = EngineConfig::from_env();
    let orchestrator = Orchestrator::new(common::unconfigured_provider(), None, config);

    let vague = orchestrator.analyze(Prompt::new("fix bug"), None).await;
    let rich = orchestrator
        .analyze(
            Prompt::new(
                "로그인 플로우에서 세션 토큰 만료 시 401 대신 500이 반환되는 버그를 수정해줘.\n\
                 재현 코드:\n```rust\nfn refresh() {}\n```\n\
                 출력은 수정된 코드와 테스트로, 기존 API 계약은 변경하지 말 것.\n\
                 완료 조건: 만료된 토큰으로 요청 시 401이 반환되어야 함.\n\
                 다음 단계로 회귀 테스트를 추가해줘.",
            ),
            None,
        )
        .await;

    assert!(rich.golden.total > vague.golden.total);
}
