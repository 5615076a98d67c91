//! End-to-end tests of every JSON:API endpoint against the fantasy database.
//!
//! Each test builds its own client, so mutations never leak between tests.

use hermes_test::TestClient;
use http::{Method, StatusCode};
use serde_json::{json, Value};

fn client() -> TestClient {
    TestClient::fantasy().unwrap()
}

fn identifiers(objects: &[Value]) -> Vec<String> {
    objects
        .iter()
        .map(|object| format!("{}:{}", object["type"].as_str().unwrap(), object["id"].as_str().unwrap()))
        .collect()
}

fn ids(data: &Value) -> Vec<String> {
    data.as_array()
        .unwrap()
        .iter()
        .map(|object| object["id"].as_str().unwrap().to_string())
        .collect()
}

// Fetching

#[test]
fn test_fetch_the_hobbit() {
    let response = client().get("/books/11").send();
    response.assert_status(StatusCode::OK).assert_media_type();

    let document = response.document();
    assert_eq!(document["links"]["self"], "http://example.com/books/11");

    let data = &document["data"];
    assert_eq!(data["type"], "books");
    assert_eq!(data["id"], "11");
    assert_eq!(
        data["attributes"],
        json!({"title": "The Hobbit", "date_published": "1937-09-21"})
    );
    assert_eq!(data["relationships"]["author"]["data"], json!({"type": "authors", "id": "1"}));
    assert!(data["relationships"]["series"]["data"].is_null());

    let chapters = ids(&data["relationships"]["chapters"]["data"]);
    let expected: Vec<String> = (271..=289).map(|id: u32| id.to_string()).collect();
    assert_eq!(chapters, expected);
    assert!(document.get("included").is_none());
}

#[test]
fn test_sparse_fieldset() {
    let response = client().get("/books/11").query("fields[books]", "title,author").send();
    response.assert_status(StatusCode::OK);

    let data = response.data();
    assert_eq!(data["attributes"], json!({"title": "The Hobbit"}));
    let relationships: Vec<&String> = data["relationships"].as_object().unwrap().keys().collect();
    assert_eq!(relationships, ["author"]);
}

#[test]
fn test_include_books_and_their_series() {
    let response = client().get("/authors/1").query("include", "books,books.series").send();
    response.assert_status(StatusCode::OK);

    assert_eq!(
        identifiers(&response.included()),
        ["books:1", "series:1", "books:2", "books:3", "books:11"]
    );
    assert_eq!(ids(&response.data()["relationships"]["books"]["data"]), ["1", "2", "3", "11"]);
}

#[test]
fn test_fetch_collection() {
    let response = client().get("/books").send();
    response.assert_status(StatusCode::OK);

    let books = ids(&response.data());
    assert_eq!(books.len(), 11);
    assert_eq!(books[0], "1");
    assert_eq!(response.document()["links"]["self"], "http://example.com/books");
}

#[test]
fn test_fetch_collection_pages() {
    let client = client();

    let first = client.get("/books").query("page[size]", "5").send();
    first.assert_status(StatusCode::OK);
    assert_eq!(ids(&first.data()), ["1", "2", "3", "4", "5"]);
    let links = first.document()["links"].clone();
    assert!(links["prev"].is_null());
    assert_eq!(
        links["next"],
        "http://example.com/books?page%5Bnumber%5D=2&page%5Bsize%5D=5"
    );

    let last = client
        .get("/books")
        .query("page[number]", "3")
        .query("page[size]", "5")
        .send();
    assert_eq!(ids(&last.data()), ["11"]);
    assert!(last.document()["links"]["next"].is_null());
}

#[test]
fn test_fetch_related() {
    let client = client();

    let author = client.get("/books/11/author").send();
    author.assert_status(StatusCode::OK);
    assert_eq!(author.data()["type"], "authors");
    assert_eq!(author.data()["attributes"]["name"], "J. R. R. Tolkien");
    assert_eq!(author.document()["links"]["self"], "http://example.com/books/11/author");

    let series = client.get("/books/11/series").send();
    series.assert_status(StatusCode::OK);
    assert!(series.data().is_null());

    let chapters = client.get("/books/11/chapters").query("page[size]", "10").send();
    chapters.assert_status(StatusCode::OK);
    let page = ids(&chapters.data());
    assert_eq!(page.len(), 10);
    assert_eq!(page[0], "271");
}

#[test]
fn test_fetch_related_with_include() {
    let response = client().get("/series/1/books").query("include", "author").send();
    response.assert_status(StatusCode::OK);
    assert_eq!(ids(&response.data()), ["1", "2", "3"]);
    assert_eq!(identifiers(&response.included()), ["authors:1"]);
}

#[test]
fn test_fetch_relationship() {
    let client = client();

    let author = client.get("/books/11/relationships/author").send();
    author.assert_status(StatusCode::OK);
    assert_eq!(
        author.document(),
        json!({
            "data": {"type": "authors", "id": "1"},
            "links": {
                "self": "http://example.com/books/11/relationships/author",
                "related": "http://example.com/books/11/author"
            }
        })
    );

    let chapters = client.get("/books/11/relationships/chapters").send();
    assert_eq!(chapters.data().as_array().unwrap().len(), 19);
    assert_eq!(
        chapters.document()["links"]["related"],
        "http://example.com/books/11/chapters"
    );
}

// Query parameter errors

#[test]
fn test_invalid_include_is_rejected_before_the_store() {
    let client = client();
    client
        .get("/books/11")
        .query("include", "publisher")
        .send()
        .assert_error(StatusCode::BAD_REQUEST, "Invalid Include");

    // A missing object would be a 404 if the store were consulted first.
    let response = client.get("/books/999").query("include", "publisher").send();
    response.assert_error(StatusCode::BAD_REQUEST, "Invalid Include");
    assert_eq!(response.errors()[0]["source"]["parameter"], "include");
}

#[test]
fn test_invalid_fieldset() {
    client()
        .get("/books/11")
        .query("fields[books]", "isbn")
        .send()
        .assert_error(StatusCode::BAD_REQUEST, "Invalid Field");
}

#[test]
fn test_invalid_page() {
    let client = client();
    client
        .get("/books")
        .query("page[size]", "many")
        .send()
        .assert_error(StatusCode::BAD_REQUEST, "Invalid Page Parameter");
    client
        .get("/books/11")
        .query("page[size]", "2")
        .send()
        .assert_error(StatusCode::BAD_REQUEST, "Invalid Query Parameter");
}

// Creating and updating

#[test]
fn test_create_series() {
    let client = client();
    let response = client
        .post("/series")
        .json(&json!({
            "data": {
                "type": "series",
                "attributes": {"title": "Middle-earth"},
                "relationships": {"books": {"data": [{"type": "books", "id": "11"}]}}
            }
        }))
        .send();
    response.assert_status(StatusCode::CREATED).assert_media_type();
    assert_eq!(response.location(), Some("http://example.com/series/3"));
    assert_eq!(response.data()["id"], "3");
    assert_eq!(response.data()["attributes"]["title"], "Middle-earth");

    let books = client.get("/series/3/books").send();
    assert_eq!(ids(&books.data()), ["11"]);
}

#[test]
fn test_create_with_schema_violations() {
    let response = client()
        .post("/books")
        .json(&json!({"data": {"attributes": {"isbn": "123"}}}))
        .send();
    response.assert_error(StatusCode::BAD_REQUEST, "Validation Error");
    let pointers: Vec<Value> = response
        .errors()
        .iter()
        .map(|error| error["source"]["pointer"].clone())
        .collect();
    assert_eq!(pointers, [json!("/data/type"), json!("/data/attributes/isbn")]);
}

#[test]
fn test_create_with_wrong_type_conflicts() {
    client()
        .post("/books")
        .json(&json!({"data": {"type": "authors", "attributes": {"name": "Nobody"}}}))
        .send()
        .assert_error(StatusCode::CONFLICT, "Conflict");
}

#[test]
fn test_create_existing_id_conflicts() {
    client()
        .post("/series")
        .json(&json!({"data": {"type": "series", "id": "1", "attributes": {"title": "Again"}}}))
        .send()
        .assert_error(StatusCode::CONFLICT, "Resource Already Exists");
}

#[test]
fn test_update_book() {
    let client = client();
    let response = client
        .patch("/books/11")
        .json(&json!({
            "data": {
                "type": "books",
                "id": "11",
                "attributes": {"title": "There and Back Again"},
                "relationships": {"series": {"data": {"type": "series", "id": "1"}}}
            }
        }))
        .send();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["attributes"]["title"], "There and Back Again");
    assert_eq!(response.data()["attributes"]["date_published"], "1937-09-21");

    let series = client.get("/books/11/series").send();
    assert_eq!(series.data()["id"], "1");
}

#[test]
fn test_update_missing_object() {
    client()
        .patch("/books/999")
        .json(&json!({"data": {"type": "books", "id": "999", "attributes": {}}}))
        .send()
        .assert_error(StatusCode::NOT_FOUND, "Resource Not Found");
}

// Relationship mutations

#[test]
fn test_add_to_one_relationship_is_not_allowed() {
    let client = client();
    client
        .post("/books/11/relationships/author")
        .json(&json!({"data": {"type": "authors", "id": "2"}}))
        .send()
        .assert_error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");

    let author = client.get("/books/11/relationships/author").send();
    assert_eq!(author.data()["id"], "1");
}

#[test]
fn test_remove_and_add_chapters() {
    let client = client();
    let chapter = json!({"data": [{"type": "chapters", "id": "271"}]});

    client
        .delete("/books/11/relationships/chapters")
        .json(&chapter)
        .send()
        .assert_no_content();
    let linkage = client.get("/books/11/relationships/chapters").send();
    assert_eq!(linkage.data().as_array().unwrap().len(), 18);

    client
        .post("/books/11/relationships/chapters")
        .json(&chapter)
        .send()
        .assert_no_content();
    let linkage = client.get("/books/11/relationships/chapters").send();
    assert_eq!(linkage.data().as_array().unwrap().len(), 19);
}

#[test]
fn test_replace_to_one_relationship() {
    let client = client();
    client
        .patch("/books/11/relationships/series")
        .json(&json!({"data": {"type": "series", "id": "1"}}))
        .send()
        .assert_no_content();
    let books = client.get("/series/1/relationships/books").send();
    assert_eq!(ids(&books.data()), ["1", "2", "3", "11"]);

    client
        .patch("/books/11/relationships/series")
        .json(&json!({"data": null}))
        .send()
        .assert_no_content();
    assert!(client.get("/books/11/series").send().data().is_null());
}

#[test]
fn test_relationship_linkage_must_name_existing_objects() {
    let response = client()
        .patch("/books/11/relationships/author")
        .json(&json!({"data": {"type": "authors", "id": "99"}}))
        .send();
    response.assert_error(StatusCode::NOT_FOUND, "Resource Not Found");
}

// Routing and transport

#[test]
fn test_unknown_routes() {
    let client = client();
    client
        .get("/dragons")
        .send()
        .assert_error(StatusCode::NOT_FOUND, "Resource Type Not Found");
    client
        .get("/books/999")
        .send()
        .assert_error(StatusCode::NOT_FOUND, "Resource Not Found");
    client
        .get("/books/11/publisher")
        .send()
        .assert_error(StatusCode::NOT_FOUND, "Relationship Not Found");
    client
        .get("/books/11/chapters/271/extra")
        .send()
        .assert_error(StatusCode::NOT_FOUND, "Not Found");
}

#[test]
fn test_percent_encoded_id() {
    let response = client().get("/books/%31%31").send();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["id"], "11");
    assert_eq!(response.document()["links"]["self"], "http://example.com/books/11");
}

#[test]
fn test_page_number_far_past_the_end() {
    let response = client()
        .get("/books")
        .query("page[number]", usize::MAX.to_string())
        .send();
    response.assert_status(StatusCode::OK);
    assert!(response.data().as_array().unwrap().is_empty());
    assert!(response.document()["links"]["next"].is_null());
}

#[test]
fn test_unsupported_methods() {
    let client = client();
    client
        .delete("/books/11")
        .send()
        .assert_error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    client
        .request(Method::PUT, "/books")
        .send()
        .assert_error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
}

#[test]
fn test_malformed_body() {
    client()
        .post("/series")
        .body("{\"data\":")
        .send()
        .assert_error(StatusCode::BAD_REQUEST, "Invalid JSON");
}
