//! End-to-end tests of the HTTP API
//!
//! Require a PostgreSQL database in `DATABASE_URL`; skipped otherwise.
//! Every test registers its own users with unique emails, so tests can run
//! in parallel against the same database.

mod common;

use axum::http::StatusCode;
use common::{id_of, items_of, TestContext};
use serde_json::json;
use uuid::Uuid;

macro_rules! context {
    () => {
        match TestContext::new().await {
            Some(ctx) => ctx,
            None => return,
        }
    };
}

#[tokio::test]
async fn test_health_check() {
    let ctx = context!();

    let (status, body) = ctx.send("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert!(body["migrations"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_authentication_required() {
    let ctx = context!();

    let (status, _) = ctx.send("GET", "/workspaces", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.send("GET", "/workspaces", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation_and_duplicates() {
    let ctx = context!();

    let (status, body) = ctx
        .send(
            "POST",
            "/users/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "short", "name": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"].as_array().unwrap().len(), 3);

    let ann = ctx.user("ann").await;

    let (status, body) = ctx
        .send(
            "POST",
            "/users/register",
            None,
            Some(json!({ "email": ann.email.to_uppercase(), "password": common::TEST_PASSWORD, "name": "Ann" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
}

#[tokio::test]
async fn test_login_returns_profile_and_rejects_bad_password() {
    let ctx = context!();
    let ann = ctx.user("ann").await;

    let (status, body) = ctx
        .send(
            "POST",
            "/users/login",
            None,
            Some(json!({ "email": ann.email, "password": common::TEST_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "ann");
    assert_eq!(body["email"], ann.email.as_str());
    assert!(body["token"].is_string());

    let (status, _) = ctx
        .send(
            "POST",
            "/users/login",
            None,
            Some(json!({ "email": ann.email, "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let ctx = context!();
    let ann = ctx.user("ann").await;

    let (status, _) = ctx.send("GET", "/workspaces", Some(&ann.token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.send("POST", "/users/logout", Some(&ann.token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.send("GET", "/workspaces", Some(&ann.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_new_login_replaces_previous_token() {
    let ctx = context!();
    let ann = ctx.user("ann").await;

    let second = ctx.login(&ann.email).await;
    assert_ne!(second, ann.token);

    let (status, _) = ctx.send("GET", "/workspaces", Some(&ann.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.send("GET", "/workspaces", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_list_with_product() {
    let ctx = context!();
    let ann = ctx.user("ann").await;

    let w1 = ctx.workspace(&ann, "Home").await;
    let p1 = ctx.product(&ann, w1, "Milk").await;

    let (status, body) = ctx
        .send(
            "POST",
            &format!("/workspaces/{}/product-lists", w1),
            Some(&ann.token),
            Some(json!({ "title": "Weekly", "products": [{ "product_id": p1, "quantity": 2 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["status"], 1);

    let (status, body) = ctx
        .send("GET", &format!("/workspaces/{}/product-lists", w1), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let lists = body.as_array().unwrap();
    assert_eq!(lists.len(), 1);

    let products = lists[0]["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["product_id"], p1.to_string());
    assert_eq!(products[0]["name"], "Milk");
    assert_eq!(products[0]["quantity"], 2);
    assert_eq!(products[0]["checked"], false);
}

#[tokio::test]
async fn test_non_positive_quantity_defaults_to_one() {
    let ctx = context!();
    let ann = ctx.user("ann").await;
    let w = ctx.workspace(&ann, "Home").await;
    let p = ctx.product(&ann, w, "Eggs").await;

    let (status, body) = ctx
        .send(
            "POST",
            &format!("/workspaces/{}/product-lists", w),
            Some(&ann.token),
            Some(json!({ "title": "Weekly", "products": [{ "product_id": p, "quantity": 0 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(items_of(&body), vec![(p, 1)]);
}

#[tokio::test]
async fn test_membership_grants_and_revokes_access() {
    let ctx = context!();
    let ann = ctx.user("ann").await;
    let bob = ctx.user("bob").await;
    let w1 = ctx.workspace(&ann, "Home").await;
    let products_uri = format!("/workspaces/{}/products", w1);

    let (status, _) = ctx.send("GET", &products_uri, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send("POST", &format!("/workspaces/{}/add_user/{}", w1, bob.id), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = ctx.send("GET", &products_uri, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::OK);

    // Members can use the workspace but not manage it
    let (status, _) = ctx
        .send("GET", &format!("/workspaces/{}", w1), Some(&bob.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .send("GET", &format!("/workspaces/{}/users", w1), Some(&bob.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["id"], ann.id.to_string());
    assert_eq!(users[0]["role"], "owner");
    assert_eq!(users[1]["id"], bob.id.to_string());
    assert_eq!(users[1]["role"], "member");

    let (status, _) = ctx
        .send("DELETE", &format!("/workspaces/{}/remove_user/{}", w1, bob.id), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.send("GET", &products_uri, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Re-adding after removal is a fresh grant
    let (status, _) = ctx
        .send("POST", &format!("/workspaces/{}/add_user/{}", w1, bob.id), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let grants: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM workspace_users WHERE workspace_id = $1 AND user_id = $2",
    )
    .bind(w1)
    .bind(bob.id)
    .fetch_one(&ctx.db)
    .await
    .unwrap();
    assert_eq!(grants, 2);
}

#[tokio::test]
async fn test_membership_errors() {
    let ctx = context!();
    let ann = ctx.user("ann").await;
    let bob = ctx.user("bob").await;
    let w = ctx.workspace(&ann, "Home").await;

    let (status, _) = ctx
        .send("POST", &format!("/workspaces/{}/add_user/{}", w, ann.id), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send("POST", &format!("/workspaces/{}/add_user/{}", w, Uuid::new_v4()), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send("DELETE", &format!("/workspaces/{}/remove_user/{}", w, bob.id), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send("POST", &format!("/workspaces/{}/add_user/{}", w, bob.id), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = ctx
        .send("POST", &format!("/workspaces/{}/add_user/{}", w, bob.id), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Only the owner manages members
    let carl = ctx.user("carl").await;
    let (status, _) = ctx
        .send("POST", &format!("/workspaces/{}/add_user/{}", w, carl.id), Some(&bob.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deleted_workspace_is_inaccessible() {
    let ctx = context!();
    let ann = ctx.user("ann").await;
    let w = ctx.workspace(&ann, "Home").await;

    let (status, _) = ctx
        .send("DELETE", &format!("/workspaces/{}", w), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .send("GET", &format!("/workspaces/{}/products", w), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx.send("GET", "/workspaces", Some(&ann.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().iter().all(|ws| ws["id"] != w.to_string()));
}

#[tokio::test]
async fn test_workspace_rename() {
    let ctx = context!();
    let ann = ctx.user("ann").await;
    let w = ctx.workspace(&ann, "Home").await;

    let (status, body) = ctx
        .send("PATCH", &format!("/workspaces/{}", w), Some(&ann.token), Some(json!({ "name": "Cabin" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Cabin");
}

#[tokio::test]
async fn test_owner_only_workspace_writes() {
    let ctx = context!();
    let ann = ctx.user("ann").await;
    let bob = ctx.user("bob").await;
    let w = ctx.workspace(&ann, "Home").await;

    let (status, _) = ctx
        .send("POST", &format!("/workspaces/{}/add_user/{}", w, bob.id), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = ctx
        .send("PATCH", &format!("/workspaces/{}", w), Some(&bob.token), Some(json!({ "name": "Mine" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send("DELETE", &format!("/workspaces/{}", w), Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx.send("GET", &format!("/workspaces/{}", w), Some(&ann.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Home");

    let (status, _) = ctx.send("DELETE", &format!("/workspaces/{}", w), Some(&ann.token), None).await;
    assert_eq!(status, StatusCode::OK);

    // A second delete and a rename both find nothing live
    let (status, _) = ctx.send("DELETE", &format!("/workspaces/{}", w), Some(&ann.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send("PATCH", &format!("/workspaces/{}", w), Some(&ann.token), Some(json!({ "name": "Cabin" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blank_names_and_titles_rejected() {
    let ctx = context!();
    let ann = ctx.user("ann").await;

    let (status, body) = ctx
        .send("POST", "/workspaces", Some(&ann.token), Some(json!({ "name": " " })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    assert_eq!(body["details"][0]["field"], "name");

    let owned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workspaces WHERE owner_id = $1")
        .bind(ann.id)
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert_eq!(owned, 0);

    let w = ctx.workspace(&ann, "Home").await;

    let (status, _) = ctx
        .send("PATCH", &format!("/workspaces/{}", w), Some(&ann.token), Some(json!({ "name": "\t" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = ctx
        .send(
            "POST",
            &format!("/workspaces/{}/products", w),
            Some(&ann.token),
            Some(json!({ "title": "   ", "unit_type": "pcs", "price": 1.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = ctx
        .send(
            "POST",
            &format!("/workspaces/{}/product-lists", w),
            Some(&ann.token),
            Some(json!({ "title": "   " })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE workspace_id = $1")
        .bind(w)
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    let lists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lists WHERE workspace_id = $1")
        .bind(w)
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert_eq!((products, lists), (0, 0));

    let (status, body) = ctx.send("GET", &format!("/workspaces/{}", w), Some(&ann.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Home");

    let p = ctx.product(&ann, w, "Milk").await;
    let (status, _) = ctx
        .send(
            "PATCH",
            &format!("/workspaces/{}/products/{}", w, p),
            Some(&ann.token),
            Some(json!({ "title": " " })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, list) = ctx
        .send(
            "POST",
            &format!("/workspaces/{}/product-lists", w),
            Some(&ann.token),
            Some(json!({ "title": "Weekly" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = ctx
        .send(
            "PATCH",
            &format!("/workspaces/{}/product-lists/{}", w, id_of(&list)),
            Some(&ann.token),
            Some(json!({ "title": "  " })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, list) = ctx
        .send(
            "GET",
            &format!("/workspaces/{}/product-lists/{}", w, id_of(&list)),
            Some(&ann.token),
            None,
        )
        .await;
    assert_eq!(list["title"], "Weekly");
}

#[tokio::test]
async fn test_cross_workspace_product_rejected() {
    let ctx = context!();
    let ann = ctx.user("ann").await;
    let w1 = ctx.workspace(&ann, "Home").await;
    let w2 = ctx.workspace(&ann, "Office").await;
    let foreign = ctx.product(&ann, w2, "Toner").await;

    let (status, body) = ctx
        .send(
            "POST",
            &format!("/workspaces/{}/product-lists", w1),
            Some(&ann.token),
            Some(json!({ "title": "Weekly", "products": [{ "product_id": foreign, "quantity": 1 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains(&foreign.to_string()));

    let (_, body) = ctx
        .send("GET", &format!("/workspaces/{}/product-lists", w1), Some(&ann.token), None)
        .await;
    assert!(body.as_array().unwrap().is_empty());

    // Product routes are scoped to the path's workspace too
    let (status, _) = ctx
        .send(
            "PATCH",
            &format!("/workspaces/{}/products/{}", w1, foreign),
            Some(&ann.token),
            Some(json!({ "price": 2.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_search_and_soft_delete() {
    let ctx = context!();
    let ann = ctx.user("ann").await;
    let w = ctx.workspace(&ann, "Home").await;
    let milk = ctx.product(&ann, w, "Oat Milk").await;
    ctx.product(&ann, w, "Bread").await;

    let (_, body) = ctx
        .send("GET", &format!("/workspaces/{}/products?name=MILK", w), Some(&ann.token), None)
        .await;
    let found = body.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(id_of(&found[0]), milk);

    let (status, _) = ctx
        .send("DELETE", &format!("/workspaces/{}/products/{}", w, milk), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = ctx
        .send("GET", &format!("/workspaces/{}/products", w), Some(&ann.token), None)
        .await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = ctx
        .send("DELETE", &format!("/workspaces/{}/products/{}", w, milk), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_product_has_no_name_on_lists() {
    let ctx = context!();
    let ann = ctx.user("ann").await;
    let w = ctx.workspace(&ann, "Home").await;
    let p = ctx.product(&ann, w, "Butter").await;

    let (_, list) = ctx
        .send(
            "POST",
            &format!("/workspaces/{}/product-lists", w),
            Some(&ann.token),
            Some(json!({ "title": "Weekly", "products": [{ "product_id": p }] })),
        )
        .await;
    let list_id = id_of(&list);

    ctx.send("DELETE", &format!("/workspaces/{}/products/{}", w, p), Some(&ann.token), None)
        .await;

    let (status, body) = ctx
        .send("GET", &format!("/workspaces/{}/product-lists/{}", w, list_id), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["products"][0]["name"].is_null());
}

#[tokio::test]
async fn test_update_list_reconciles_items() {
    let ctx = context!();
    let ann = ctx.user("ann").await;
    let w = ctx.workspace(&ann, "Home").await;
    let p1 = ctx.product(&ann, w, "Milk").await;
    let p2 = ctx.product(&ann, w, "Bread").await;
    let p3 = ctx.product(&ann, w, "Jam").await;

    let (_, list) = ctx
        .send(
            "POST",
            &format!("/workspaces/{}/product-lists", w),
            Some(&ann.token),
            Some(json!({ "title": "Weekly", "products": [
                { "product_id": p1, "quantity": 1 },
                { "product_id": p2, "quantity": 1 }
            ] })),
        )
        .await;
    let list_uri = format!("/workspaces/{}/product-lists/{}", w, id_of(&list));

    let update = json!({ "title": "Weekend", "products": [
        { "product_id": p2, "quantity": 3 },
        { "product_id": p3 }
    ] });

    let (status, first) = ctx.send("PATCH", &list_uri, Some(&ann.token), Some(update.clone())).await;
    assert_eq!(status, StatusCode::OK, "{}", first);
    assert_eq!(first["title"], "Weekend");

    let mut expected = vec![(p2, 3), (p3, 1)];
    expected.sort();
    assert_eq!(items_of(&first), expected);

    // Applying the same target set again changes nothing visible
    let (_, second) = ctx.send("PATCH", &list_uri, Some(&ann.token), Some(update)).await;
    assert_eq!(items_of(&second), expected);

    // Omitting products leaves items alone; an empty set clears them
    let (_, renamed) = ctx
        .send("PATCH", &list_uri, Some(&ann.token), Some(json!({ "title": "Sunday" })))
        .await;
    assert_eq!(items_of(&renamed), expected);

    let (_, cleared) = ctx
        .send("PATCH", &list_uri, Some(&ann.token), Some(json!({ "products": [] })))
        .await;
    assert!(items_of(&cleared).is_empty());
}

#[tokio::test]
async fn test_reconcile_with_foreign_product_rolls_back() {
    let ctx = context!();
    let ann = ctx.user("ann").await;
    let w1 = ctx.workspace(&ann, "Home").await;
    let w2 = ctx.workspace(&ann, "Office").await;
    let p1 = ctx.product(&ann, w1, "Milk").await;
    let foreign = ctx.product(&ann, w2, "Toner").await;

    let (_, list) = ctx
        .send(
            "POST",
            &format!("/workspaces/{}/product-lists", w1),
            Some(&ann.token),
            Some(json!({ "title": "Weekly", "products": [{ "product_id": p1, "quantity": 2 }] })),
        )
        .await;
    let list_uri = format!("/workspaces/{}/product-lists/{}", w1, id_of(&list));

    let (status, _) = ctx
        .send(
            "PATCH",
            &list_uri,
            Some(&ann.token),
            Some(json!({ "title": "Changed", "products": [{ "product_id": foreign }] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, after) = ctx.send("GET", &list_uri, Some(&ann.token), None).await;
    assert_eq!(after["title"], "Weekly");
    assert_eq!(items_of(&after), vec![(p1, 2)]);
}

#[tokio::test]
async fn test_status_transitions_and_cascade() {
    let ctx = context!();
    let ann = ctx.user("ann").await;
    let w = ctx.workspace(&ann, "Home").await;

    let (_, list) = ctx
        .send(
            "POST",
            &format!("/workspaces/{}/product-lists", w),
            Some(&ann.token),
            Some(json!({ "title": "Weekly" })),
        )
        .await;
    let list_id = id_of(&list);
    let status_uri = format!("/workspaces/{}/product-lists/{}/status", w, list_id);

    let (status, _) = ctx
        .send("PATCH", &status_uri, Some(&ann.token), Some(json!({ "status": 7 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx
        .send("PATCH", &status_uri, Some(&ann.token), Some(json!({ "status": 2 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 2);

    let (_, body) = ctx
        .send("PATCH", &status_uri, Some(&ann.token), Some(json!({ "status": 1 })))
        .await;
    assert_eq!(body["status"], 1);

    let (status, body) = ctx
        .send("PATCH", &status_uri, Some(&ann.token), Some(json!({ "status": 0 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 0);
    assert!(body["deleted_at"].is_string());

    let (row_status, deleted): (i16, bool) =
        sqlx::query_as("SELECT status, deleted_at IS NOT NULL FROM lists WHERE id = $1")
            .bind(list_id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!((row_status, deleted), (0, true));

    let (_, lists) = ctx
        .send("GET", &format!("/workspaces/{}/product-lists", w), Some(&ann.token), None)
        .await;
    assert!(lists.as_array().unwrap().is_empty());

    // Deleted is terminal
    let (status, _) = ctx
        .send("PATCH", &status_uri, Some(&ann.token), Some(json!({ "status": 1 })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_item_check_and_removal() {
    let ctx = context!();
    let ann = ctx.user("ann").await;
    let w = ctx.workspace(&ann, "Home").await;
    let p1 = ctx.product(&ann, w, "Milk").await;
    let p2 = ctx.product(&ann, w, "Bread").await;

    let (_, list) = ctx
        .send(
            "POST",
            &format!("/workspaces/{}/product-lists", w),
            Some(&ann.token),
            Some(json!({ "title": "Weekly", "products": [
                { "product_id": p1, "quantity": 1 },
                { "product_id": p2, "quantity": 4 }
            ] })),
        )
        .await;
    let list_uri = format!("/workspaces/{}/product-lists/{}", w, id_of(&list));

    let (status, item) = ctx
        .send(
            "PATCH",
            &format!("{}/products/{}", list_uri, p2),
            Some(&ann.token),
            Some(json!({ "checked": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["checked"], true);

    let (status, _) = ctx
        .send("DELETE", &format!("{}/products/{}", list_uri, p1), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, after) = ctx.send("GET", &list_uri, Some(&ann.token), None).await;
    assert_eq!(items_of(&after), vec![(p2, 4)]);
    assert_eq!(after["products"][0]["checked"], true);

    let (status, _) = ctx
        .send("DELETE", &format!("{}/products/{}", list_uri, p1), Some(&ann.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send(
            "PATCH",
            &format!("{}/products/{}", list_uri, p1),
            Some(&ann.token),
            Some(json!({ "checked": true })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
