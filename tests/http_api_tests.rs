mod common;

use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};

use common::{arithmetic_quiz, choice_id, TestHarness};
use quiz_attempt_server::{
    auth::JwtService,
    graphql::create_schema,
    handlers::configure_routes,
    middleware::{RequestIdMiddleware, REQUEST_ID_HEADER},
    models::domain::{User, UserRole},
};

struct Caller {
    token: String,
}

impl Caller {
    fn bearer(&self) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.token))
    }
}

async fn caller(harness: &TestHarness, jwt: &JwtService, username: &str, role: UserRole) -> Caller {
    let user = User::new(username, &format!("{}@example.com", username), role);
    let token = jwt.create_token(&user).expect("token");
    harness.users.insert(user).await;
    Caller { token }
}

macro_rules! test_app {
    ($harness:expr, $jwt:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(Arc::new($harness.state.clone())))
                .app_data(web::Data::new($jwt.clone()))
                .app_data(web::Data::new(create_schema($harness.state.clone())))
                .wrap(RequestIdMiddleware)
                .configure(configure_routes),
        )
        .await
    };
}

fn jwt_for(harness: &TestHarness) -> JwtService {
    JwtService::new(&harness.state.config.jwt_secret, 1)
}

#[actix_web::test]
async fn health_is_public() {
    let harness = TestHarness::new();
    let jwt = jwt_for(&harness);
    let app = test_app!(harness, jwt);

    let res = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key(REQUEST_ID_HEADER));
}

#[actix_web::test]
async fn attempt_routes_require_a_token() {
    let harness = TestHarness::new();
    let jwt = jwt_for(&harness);
    let app = test_app!(harness, jwt);

    let req = test::TestRequest::post()
        .uri("/api/attempts")
        .set_json(json!({ "quiz_id": "anything" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/attempts")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .set_json(json!({ "quiz_id": "anything" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn full_attempt_over_rest() {
    let harness = TestHarness::new();
    let jwt = jwt_for(&harness);
    let quiz = arithmetic_quiz();
    harness.quizzes.insert(quiz.clone()).await;
    let alice = caller(&harness, &jwt, "alice", UserRole::User).await;
    let app = test_app!(harness, jwt);

    let req = test::TestRequest::post()
        .uri("/api/attempts")
        .insert_header(alice.bearer())
        .set_json(json!({ "quiz_id": quiz.id }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let started: Value = test::read_body_json(res).await;
    assert_eq!(started["status"], "in-progress");
    assert_eq!(started["time_limit"], 10);
    let result_id = started["result_id"].as_str().expect("result id").to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/attempts/{}/questions", result_id))
        .insert_header(alice.bearer())
        .to_request();
    let paper: Value = test::call_and_read_body_json(&app, req).await;
    let choices = paper["questions"][0]["choices"].as_array().expect("choices");
    assert_eq!(choices.len(), 3);
    assert!(choices.iter().all(|c| c.get("is_correct").is_none()));

    let req = test::TestRequest::post()
        .uri(&format!("/api/attempts/{}/answers", result_id))
        .insert_header(alice.bearer())
        .set_json(json!({
            "quiz_id": quiz.id,
            "answers": [{ "question_id": quiz.questions[0].id, "choice_id": choice_id(&quiz, "5") }]
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri(&format!("/api/attempts/{}/stop", result_id))
        .insert_header(alice.bearer())
        .to_request();
    let stopped: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stopped["status"], "completed");
    assert_eq!(stopped["quiz_title"], "Arithmetic");

    let req = test::TestRequest::get()
        .uri(&format!("/api/attempts/{}/feedback", result_id))
        .insert_header(alice.bearer())
        .to_request();
    let feedback: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(feedback["percentage"], 100.0);
    assert_eq!(feedback["feedback"], "Excellent! You're a star!");
    assert_eq!(feedback["answers"][0]["user_choice"], "5");
}

#[actix_web::test]
async fn business_errors_map_to_status_codes() {
    let harness = TestHarness::new();
    let jwt = jwt_for(&harness);
    let quiz = arithmetic_quiz();
    harness.quizzes.insert(quiz.clone()).await;
    let alice = caller(&harness, &jwt, "alice", UserRole::User).await;
    let mallory = caller(&harness, &jwt, "mallory", UserRole::User).await;
    let app = test_app!(harness, jwt);

    let start = |caller: &Caller| {
        test::TestRequest::post()
            .uri("/api/attempts")
            .insert_header(caller.bearer())
            .set_json(json!({ "quiz_id": quiz.id }))
            .to_request()
    };

    let started: Value = test::call_and_read_body_json(&app, start(&alice)).await;
    let result_id = started["result_id"].as_str().expect("result id").to_string();

    let res = test::call_service(&app, start(&alice)).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], 409);

    let req = test::TestRequest::post()
        .uri(&format!("/api/attempts/{}/stop", result_id))
        .insert_header(mallory.bearer())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/attempts/missing")
        .insert_header(alice.bearer())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/api/attempts/{}/answers", result_id))
        .insert_header(alice.bearer())
        .set_json(json!({ "quiz_id": quiz.id, "answers": [] }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn graphql_runs_the_same_operations() {
    let harness = TestHarness::new();
    let jwt = jwt_for(&harness);
    let quiz = arithmetic_quiz();
    harness.quizzes.insert(quiz.clone()).await;
    let alice = caller(&harness, &jwt, "alice", UserRole::User).await;
    let mallory = caller(&harness, &jwt, "mallory", UserRole::User).await;
    let app = test_app!(harness, jwt);

    let start = json!({
        "query": "mutation Start($quizId: String!) { startAttempt(input: { quizId: $quizId }) { resultId status timeLimit } }",
        "variables": { "quizId": quiz.id }
    });
    let req = test::TestRequest::post()
        .uri("/graphql")
        .insert_header(alice.bearer())
        .set_json(&start)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["startAttempt"]["status"], "IN_PROGRESS");
    assert_eq!(body["data"]["startAttempt"]["timeLimit"], 10);
    let result_id = body["data"]["startAttempt"]["resultId"]
        .as_str()
        .expect("result id")
        .to_string();

    let stop = json!({
        "query": "mutation Stop($id: ID!) { stopAttempt(resultId: $id) { status } }",
        "variables": { "id": result_id }
    });
    let req = test::TestRequest::post()
        .uri("/graphql")
        .insert_header(mallory.bearer())
        .set_json(&stop)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["errors"][0]["extensions"]["code"], "FORBIDDEN");

    let req = test::TestRequest::post()
        .uri("/graphql")
        .insert_header(alice.bearer())
        .set_json(&stop)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["stopAttempt"]["status"], "COMPLETED");

    let feedback = json!({
        "query": "query Feedback($id: ID!) { attemptFeedback(resultId: $id) { userScore noAnswers feedback } }",
        "variables": { "id": result_id }
    });
    let req = test::TestRequest::post()
        .uri("/graphql")
        .insert_header(alice.bearer())
        .set_json(&feedback)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["attemptFeedback"]["noAnswers"], 1);
    assert_eq!(body["data"]["attemptFeedback"]["feedback"], "Needs improvement. Keep practicing!");
}
