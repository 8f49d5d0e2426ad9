//! Integration tests for the courses module.
//!
//! - Each test runs on a fresh in-memory SQLite DB with the accounts and
//!   courses migrations applied.
//! - HTTP tests go through the real token middleware backed by accounts.
//! - Service tests build `Principal`s directly.

use std::sync::Arc;
use std::time::Duration;

use accounts::{
    contract::model::NewUser,
    domain::{
        password::HashCost,
        repo::UsersRepository,
        service::{Service as AccountsService, ServiceConfig as AccountsConfig},
    },
    gateways::local::AccountsLocalClient,
    infra::storage::{
        migrations::Migrator as AccountsMigrator, sea_orm_repo::SeaOrmUsersRepository,
    },
};
use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
    Router,
};
use chrono::NaiveDate;
use courses::{
    api::rest::routes,
    contract::{
        client::CoursesApi,
        error::CoursesError,
        model::{
            Course, CoursePatch, DateOrder, NewCourse, NewLesson, NewPayment, PaymentFilter,
            PaymentMethod,
        },
    },
    domain::{
        error::{
            DomainError, MSG_ALREADY_SUBSCRIBED, MSG_NOT_OWNER, MSG_NOT_SUBSCRIBED,
            MSG_PERMISSION_DENIED, MSG_SUBSCRIBED, MSG_UNSUBSCRIBED,
        },
        ports::CourseNotifier,
        repo::{CatalogRepository, SubscribeOutcome},
        service::{Service, ServiceConfig},
    },
    gateways::local::CoursesLocalClient,
    infra::storage::{migrations::Migrator, sea_orm_repo::SeaOrmCatalogRepository},
};
use modkit::{security::authenticate_request, OpenApiRegistry, Principal, Role, TokenAuthenticator};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

struct NoopRegistry;

impl OpenApiRegistry for NoopRegistry {
    fn register_doc(&self, _doc: utoipa::openapi::OpenApi) {}
}

/// Forwards every notification to a channel.
struct RecordingNotifier(mpsc::UnboundedSender<(i64, Vec<i64>)>);

#[async_trait]
impl CourseNotifier for RecordingNotifier {
    async fn course_updated(&self, course: &Course, subscriber_ids: &[i64]) -> anyhow::Result<()> {
        let _ = self.0.send((course.id, subscriber_ids.to_vec()));
        Ok(())
    }
}

async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    AccountsMigrator::up(&db, None)
        .await
        .expect("Failed to run accounts migrations");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run courses migrations");
    db
}

fn courses_on(db: &DatabaseConnection, notifier: Option<Arc<dyn CourseNotifier>>) -> Arc<Service> {
    Arc::new(Service::new(
        Arc::new(SeaOrmCatalogRepository::new(db.clone())),
        notifier,
        ServiceConfig {
            default_page_size: 2,
            max_page_size: 5,
        },
    ))
}

fn accounts_on(db: &DatabaseConnection) -> Arc<AccountsService> {
    Arc::new(AccountsService::new(
        Arc::new(SeaOrmUsersRepository::new(db.clone())),
        AccountsConfig {
            inactivity_days: 30,
            hash_cost: HashCost {
                mem_cost_kib: 64,
                time_cost: 1,
            },
        },
    ))
}

fn router_for(courses: Arc<Service>, accounts: Arc<AccountsService>) -> Router {
    let auth: Arc<dyn TokenAuthenticator> = Arc::new(AccountsLocalClient::new(accounts));
    routes::register_routes(Router::new(), &NoopRegistry, courses)
        .expect("Failed to register routes")
        .layer(from_fn_with_state(auth, authenticate_request))
}

fn principal(user_id: i64, role: Role, is_admin: bool) -> Principal {
    Principal {
        user_id,
        email: format!("u{user_id}@example.com"),
        role,
        is_admin,
    }
}

fn admin() -> Principal {
    principal(1, Role::Member, true)
}

fn new_course(title: &str, owner_id: Option<i64>) -> NewCourse {
    NewCourse {
        title: title.to_string(),
        description: "About it".to_string(),
        owner_id,
        ..Default::default()
    }
}

fn new_lesson(course_id: i64, owner_id: Option<i64>) -> NewLesson {
    NewLesson {
        title: "Intro".to_string(),
        description: "First steps".to_string(),
        url: "https://video.example.com/1".to_string(),
        course_id,
        owner_id,
        ..Default::default()
    }
}

fn payment(user_id: i64, day: u32, course_id: Option<i64>, method: PaymentMethod) -> NewPayment {
    NewPayment {
        user_id,
        date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
        course_id,
        lesson_id: None,
        amount: Some(100),
        payment_method: method,
    }
}

/// Registers (or promotes, for `is_admin`) a user and returns (id, token).
async fn account(
    accounts: &AccountsService,
    db: &DatabaseConnection,
    email: &str,
    role: Role,
    is_admin: bool,
) -> (i64, String) {
    let user = if is_admin {
        accounts.create_admin(email, "pw").await.unwrap()
    } else {
        accounts
            .register(NewUser {
                email: email.to_string(),
                password: "pw".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
    };
    if role == Role::Moderator {
        let repo = SeaOrmUsersRepository::new(db.clone());
        let mut record = repo.find_by_id(user.id).await.unwrap().unwrap();
        record.user.role = Role::Moderator;
        repo.update(&record).await.unwrap();
    }
    let token = accounts.login(email, "pw").await.unwrap().token;
    (user.id, token)
}

async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header("authorization", format!("Token {t}"));
    }
    let req = match body {
        Some(b) => req
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn subscribe_twice_then_unsubscribe_twice_over_http() {
    let db = create_test_db().await;
    let accounts = accounts_on(&db);
    let courses = courses_on(&db, None);
    let (_, token) = account(&accounts, &db, "u@example.com", Role::Member, false).await;
    let course = courses
        .create_course(&admin(), new_course("Rust", None))
        .await
        .unwrap()
        .course;
    let router = router_for(courses, accounts);
    let path = format!("/courses/{}/subscribe", course.id);

    let (status, body) = call(&router, "POST", &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["detail"], MSG_SUBSCRIBED);

    let (status, body) = call(&router, "POST", &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], MSG_ALREADY_SUBSCRIBED);

    let (status, body) = call(&router, "GET", "/courses?limit=5", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["is_subscribed"], true);

    let (status, body) = call(&router, "DELETE", &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], MSG_UNSUBSCRIBED);

    let (status, body) = call(&router, "DELETE", &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], MSG_NOT_SUBSCRIBED);

    let (status, _) = call(&router, "POST", "/courses/999/subscribe", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_requires_authentication() {
    let db = create_test_db().await;
    let router = router_for(courses_on(&db, None), accounts_on(&db));

    for uri in ["/courses", "/lessons", "/payments"] {
        let (status, _) = call(&router, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn object_access_follows_ownership_and_roles() {
    let db = create_test_db().await;
    let accounts = accounts_on(&db);
    let courses = courses_on(&db, None);
    let (_, admin_token) = account(&accounts, &db, "root@example.com", Role::Member, true).await;
    let (owner_id, owner_token) = account(&accounts, &db, "own@example.com", Role::Member, false).await;
    let (_, mod_token) = account(&accounts, &db, "mod@example.com", Role::Moderator, false).await;
    let (_, stranger_token) = account(&accounts, &db, "x@example.com", Role::Member, false).await;
    let router = router_for(courses, accounts);

    // Only admins create.
    let payload = json!({ "title": "Rust", "description": "Systems", "owner_id": owner_id });
    let (status, body) = call(&router, "POST", "/courses", Some(&owner_token), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], MSG_PERMISSION_DENIED);
    let (status, body) = call(&router, "POST", "/courses", Some(&admin_token), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["lesson_count"], 0);
    assert_eq!(body["price"], 0);
    let path = format!("/courses/{}", body["id"]);

    // Stranger: no retrieve, update or delete.
    let (status, body) = call(&router, "GET", &path, Some(&stranger_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], MSG_NOT_OWNER);
    let patch = json!({ "title": "Hacked" });
    let (status, _) = call(&router, "PATCH", &path, Some(&stranger_token), Some(patch)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&router, "DELETE", &path, Some(&stranger_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Moderator: retrieve and update, but not delete.
    let (status, _) = call(&router, "GET", &path, Some(&mod_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let patch = json!({ "description": "Moderated" });
    let (status, body) = call(&router, "PATCH", &path, Some(&mod_token), Some(patch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Moderated");
    assert_eq!(body["title"], "Rust");
    let (status, _) = call(&router, "DELETE", &path, Some(&mod_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Owner: full access.
    let put = json!({ "title": "Rust 2", "description": "Replaced", "owner_id": owner_id, "price": 50 });
    let (status, body) = call(&router, "PUT", &path, Some(&owner_token), Some(put)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 50);
    let (status, _) = call(&router, "DELETE", &path, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&router, "GET", &path, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_bodies_are_problems_checked_after_access() {
    let db = create_test_db().await;
    let accounts = accounts_on(&db);
    let courses = courses_on(&db, None);
    let (_, admin_token) = account(&accounts, &db, "root@example.com", Role::Member, true).await;
    let (_, member_token) = account(&accounts, &db, "m@example.com", Role::Member, false).await;
    let course = courses
        .create_course(&admin(), new_course("Rust", None))
        .await
        .unwrap()
        .course;
    let router = router_for(courses, accounts);
    let incomplete = json!({ "description": "d" });

    let (status, body) = call(&router, "POST", "/courses", Some(&admin_token), Some(incomplete.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BODY");
    assert_eq!(body["instance"], "/courses");
    assert!(body["detail"].as_str().unwrap().contains("title"));

    let (status, body) = call(&router, "POST", "/courses", Some(&member_token), Some(incomplete)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], MSG_PERMISSION_DENIED);

    let no_course = json!({ "title": "t", "description": "d", "url": "https://a.io/v" });
    let (status, body) = call(&router, "POST", "/lessons", Some(&admin_token), Some(no_course.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BODY");
    let (status, _) = call(&router, "POST", "/lessons", Some(&member_token), Some(no_course)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Object endpoints: missing object, then ownership, then the body.
    let wrong_type = json!({ "title": 5 });
    let path = format!("/courses/{}", course.id);
    let (status, body) = call(&router, "PATCH", &path, Some(&member_token), Some(wrong_type.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], MSG_NOT_OWNER);
    let (status, _) = call(&router, "PATCH", "/courses/999", Some(&admin_token), Some(wrong_type.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = call(&router, "PATCH", &path, Some(&admin_token), Some(wrong_type)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BODY");
}

#[tokio::test]
async fn put_without_owner_keeps_the_owner() {
    let db = create_test_db().await;
    let accounts = accounts_on(&db);
    let courses = courses_on(&db, None);
    let (owner_id, owner_token) = account(&accounts, &db, "own@example.com", Role::Member, false).await;
    let course = courses
        .create_course(&admin(), NewCourse {
            preview: Some("cover.png".to_string()),
            price: Some(70),
            ..new_course("Rust", Some(owner_id))
        })
        .await
        .unwrap()
        .course;
    let router = router_for(courses, accounts);

    let put = json!({ "title": "Rust 2", "description": "Replaced" });
    let path = format!("/courses/{}", course.id);
    let (status, body) = call(&router, "PUT", &path, Some(&owner_token), Some(put)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner_id"], owner_id);
    assert_eq!(body["preview"], Value::Null);
    assert_eq!(body["price"], 0);

    // Still the owner, so still allowed in.
    let (status, _) = call(&router, "GET", &path, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn lesson_endpoints_validate_and_count() {
    let db = create_test_db().await;
    let accounts = accounts_on(&db);
    let courses = courses_on(&db, None);
    let (_, admin_token) = account(&accounts, &db, "root@example.com", Role::Member, true).await;
    let course = courses
        .create_course(&admin(), new_course("Go", None))
        .await
        .unwrap()
        .course;
    let router = router_for(courses, accounts);

    let bad_url = json!({ "title": "L", "description": "d", "url": "not a url", "course_id": course.id });
    let (status, _) = call(&router, "POST", "/lessons", Some(&admin_token), Some(bad_url)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let no_course = json!({ "title": "L", "description": "d", "url": "https://v.io/1", "course_id": 999 });
    let (status, _) = call(&router, "POST", "/lessons", Some(&admin_token), Some(no_course)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for n in 0..3 {
        let ok = json!({ "title": format!("L{n}"), "description": "d", "url": "https://v.io/1", "course_id": course.id });
        let (status, _) = call(&router, "POST", "/lessons", Some(&admin_token), Some(ok)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = call(&router, "GET", &format!("/courses/{}", course.id), Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lesson_count"], 3);

    let (status, body) = call(&router, "GET", "/lessons", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    let (status, body) = call(&router, "GET", "/lessons?limit=50&offset=2", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["limit"], 5);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn payments_filter_and_order_by_date() -> Result<()> {
    let db = create_test_db().await;
    let accounts = accounts_on(&db);
    let courses = courses_on(&db, None);
    let (_, token) = account(&accounts, &db, "p@example.com", Role::Member, false).await;
    let c1 = courses.create_course(&admin(), new_course("A", None)).await?.course;
    let c2 = courses.create_course(&admin(), new_course("B", None)).await?.course;

    courses.record_payment(payment(7, 10, Some(c1.id), PaymentMethod::Cash)).await?;
    courses.record_payment(payment(7, 2, Some(c1.id), PaymentMethod::Transfer)).await?;
    courses.record_payment(payment(8, 20, Some(c2.id), PaymentMethod::Cash)).await?;

    let filter = PaymentFilter {
        course_id: Some(c1.id),
        order: DateOrder::Ascending,
        ..Default::default()
    };
    let page = courses.list_payments(&admin(), filter, Some(5), None).await?;
    assert_eq!(page.total, 2);
    let days: Vec<_> = page.items.iter().map(|p| p.date).collect();
    assert!(days.windows(2).all(|w| w[0] <= w[1]));

    let router = router_for(courses, accounts);
    let (status, body) = call(&router, "GET", "/payments?payment_method=cash&ordering=-date&limit=5", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"][0]["date"], "2024-03-20");
    assert_eq!(body["items"][1]["date"], "2024-03-10");
    assert_eq!(body["items"][0]["payment_method"], "cash");

    let (status, body) = call(&router, "GET", &format!("/payments?course={}&lesson=1", c2.id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);

    let (status, _) = call(&router, "GET", "/payments?ordering=amount", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(&router, "GET", "/payments?payment_method=card", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn sequential_duplicate_subscribe_stores_one_row() -> Result<()> {
    let db = create_test_db().await;
    let courses = courses_on(&db, None);
    let repo = SeaOrmCatalogRepository::new(db.clone());
    let user = principal(42, Role::Member, false);
    let course = courses.create_course(&admin(), new_course("C", None)).await?.course;

    courses.subscribe(&user, course.id).await?;
    assert!(matches!(
        courses.subscribe(&user, course.id).await,
        Err(DomainError::AlreadySubscribed { .. })
    ));
    assert_eq!(repo.subscriber_ids(course.id).await?, vec![42]);

    // The unique index rejects a raw duplicate insert too.
    assert_eq!(
        repo.insert_subscription(42, course.id).await?,
        SubscribeOutcome::Duplicate
    );
    assert_eq!(repo.subscriber_ids(course.id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn deleting_a_course_removes_dependents() -> Result<()> {
    let db = create_test_db().await;
    let courses = courses_on(&db, None);
    let repo = SeaOrmCatalogRepository::new(db.clone());
    let keep = courses.create_course(&admin(), new_course("Keep", None)).await?.course;
    let gone = courses.create_course(&admin(), new_course("Gone", None)).await?.course;
    let lesson = courses.create_lesson(&admin(), new_lesson(gone.id, None)).await?;
    courses.create_lesson(&admin(), new_lesson(keep.id, None)).await?;
    courses.subscribe(&principal(5, Role::Member, false), gone.id).await?;
    courses.record_payment(payment(5, 1, Some(gone.id), PaymentMethod::Cash)).await?;
    courses
        .record_payment(NewPayment {
            lesson_id: Some(lesson.id),
            ..payment(5, 2, None, PaymentMethod::Transfer)
        })
        .await?;
    courses.record_payment(payment(5, 3, Some(keep.id), PaymentMethod::Cash)).await?;

    courses.delete_course(&admin(), gone.id).await?;

    assert!(repo.find_course(gone.id).await?.is_none());
    assert!(repo.find_lesson(lesson.id).await?.is_none());
    assert!(repo.subscriber_ids(gone.id).await?.is_empty());
    let (left, total) = repo.list_payments(&PaymentFilter::default(), 10, 0).await?;
    assert_eq!(total, 1);
    assert_eq!(left[0].course_id, Some(keep.id));
    assert_eq!(repo.lesson_counts(&[keep.id]).await?.get(&keep.id), Some(&1));
    Ok(())
}

#[tokio::test]
async fn purge_empties_the_catalog() -> Result<()> {
    let db = create_test_db().await;
    let courses = courses_on(&db, None);
    let c = courses.create_course(&admin(), new_course("P", None)).await?.course;
    courses.create_lesson(&admin(), new_lesson(c.id, None)).await?;
    courses.create_lesson(&admin(), new_lesson(c.id, None)).await?;
    courses.record_payment(payment(1, 1, Some(c.id), PaymentMethod::Cash)).await?;

    let api: Arc<dyn CoursesApi> = Arc::new(CoursesLocalClient::new(courses.clone()));
    let stats = api.purge_catalog().await?;
    assert_eq!((stats.payments, stats.lessons, stats.courses), (1, 2, 1));

    let err = api.get_course(c.id).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<CoursesError>(),
        Some(&CoursesError::not_found("course", c.id))
    );
    assert_eq!(api.purge_catalog().await?.courses, 0);
    Ok(())
}

#[tokio::test]
async fn negative_amounts_and_prices_are_rejected() {
    let db = create_test_db().await;
    let courses = courses_on(&db, None);

    let mut p = payment(1, 1, None, PaymentMethod::Cash);
    p.amount = Some(-1);
    assert!(matches!(
        courses.record_payment(p).await,
        Err(DomainError::Validation { .. })
    ));

    let mut c = new_course("Neg", None);
    c.price = Some(-10);
    assert!(courses.create_course(&admin(), c).await.is_err());
}

#[tokio::test]
async fn update_notifies_current_subscribers() -> Result<()> {
    let db = create_test_db().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let courses = courses_on(&db, Some(Arc::new(RecordingNotifier(tx))));
    let course = courses.create_course(&admin(), new_course("N", None)).await?.course;
    courses.subscribe(&principal(10, Role::Member, false), course.id).await?;
    courses.subscribe(&principal(11, Role::Member, false), course.id).await?;

    let patch = CoursePatch {
        title: Some("N2".to_string()),
        ..Default::default()
    };
    courses.update_course(&admin(), course.id, patch).await?;

    let (course_id, subscribers) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await?
        .expect("notification");
    assert_eq!(course_id, course.id);
    assert_eq!(subscribers, vec![10, 11]);
    Ok(())
}

#[tokio::test]
async fn update_without_subscribers_sends_nothing() -> Result<()> {
    let db = create_test_db().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let courses = courses_on(&db, Some(Arc::new(RecordingNotifier(tx))));
    let course = courses.create_course(&admin(), new_course("Quiet", None)).await?.course;

    let handle = courses.notify_course_updated(course).expect("notifier configured");
    handle.await?;
    assert!(rx.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn notifications_are_off_without_a_notifier() -> Result<()> {
    let db = create_test_db().await;
    let courses = courses_on(&db, None);
    let course = courses.create_course(&admin(), new_course("Off", None)).await?.course;
    assert!(courses.notify_course_updated(course).is_none());
    Ok(())
}
