//! Test fixtures for Hermes development and testing.
//!
//! This module provides a small in-memory "fantasy database" of authors,
//! books, chapters and series, a [`FantasyStore`] serving it, and
//! [`fantasy_api`], a fully configured [`JsonApi`] over that store.
//!
//! # Example
//!
//! ```
//! use hermes_core::fixtures::fantasy_api;
//!
//! let api = fantasy_api("http://example.com").unwrap();
//! let books = api.registry().by_type("books").unwrap();
//! assert_eq!(books.store().count(books.model()).unwrap(), 11);
//! ```

use crate::api::JsonApi;
use crate::error::JsonApiResult;
use crate::pagination::Pagination;
use crate::registry::{ModelType, ResourceDescriptor};
use crate::store::{
    instance, Accessor, FieldValue, Fields, Instance, Related, RelatedIds, Store, StoreError,
    StoreResult,
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// An author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    /// Primary key.
    pub id: u64,
    /// Full name.
    pub name: String,
    /// Date of birth.
    pub date_of_birth: Option<NaiveDate>,
    /// Date of death, if any.
    pub date_of_death: Option<NaiveDate>,
}

/// A book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Primary key.
    pub id: u64,
    /// Title.
    pub title: String,
    /// Publication date.
    pub date_published: Option<NaiveDate>,
    /// Author foreign key.
    pub author_id: Option<u64>,
    /// Series foreign key.
    pub series_id: Option<u64>,
}

/// A chapter of a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Primary key.
    pub id: u64,
    /// Title.
    pub title: String,
    /// Position within the book.
    pub ordering: u32,
    /// Book foreign key.
    pub book_id: Option<u64>,
}

/// A book series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    /// Primary key.
    pub id: u64,
    /// Title.
    pub title: String,
}

#[derive(Debug, Default)]
struct Tables {
    authors: BTreeMap<u64, Author>,
    books: BTreeMap<u64, Book>,
    chapters: BTreeMap<u64, Chapter>,
    series: BTreeMap<u64, Series>,
}

enum Model<'a> {
    Author(&'a Author),
    Book(&'a Book),
    Chapter(&'a Chapter),
    Series(&'a Series),
}

fn classify(instance: &Instance) -> StoreResult<Model<'_>> {
    if let Some(author) = instance.downcast_ref::<Author>() {
        Ok(Model::Author(author))
    } else if let Some(book) = instance.downcast_ref::<Book>() {
        Ok(Model::Book(book))
    } else if let Some(chapter) = instance.downcast_ref::<Chapter>() {
        Ok(Model::Chapter(chapter))
    } else if let Some(series) = instance.downcast_ref::<Series>() {
        Ok(Model::Series(series))
    } else {
        Err(StoreError::UnsupportedModel)
    }
}

fn date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

const HOBBIT_CHAPTERS: [&str; 19] = [
    "An Unexpected Party",
    "Roast Mutton",
    "A Short Rest",
    "Over Hill and Under Hill",
    "Riddles in the Dark",
    "Out of the Frying-Pan into the Fire",
    "Queer Lodgings",
    "Flies and Spiders",
    "Barrels Out of Bond",
    "A Warm Welcome",
    "On the Doorstep",
    "Inside Information",
    "Not at Home",
    "Fire and Water",
    "The Gathering of the Clouds",
    "A Thief in the Night",
    "The Clouds Burst",
    "The Return Journey",
    "The Last Stage",
];

impl Tables {
    fn seeded() -> Self {
        let mut tables = Self::default();

        for (id, name, born, died) in [
            (1, "J. R. R. Tolkien", date(1892, 1, 3), date(1973, 9, 2)),
            (2, "J. K. Rowling", date(1965, 7, 31), None),
            (3, "George R. R. Martin", date(1948, 9, 20), None),
        ] {
            tables.authors.insert(
                id,
                Author {
                    id,
                    name: name.to_string(),
                    date_of_birth: born,
                    date_of_death: died,
                },
            );
        }

        for (id, title) in [(1, "The Lord of the Rings"), (2, "Harry Potter")] {
            tables.series.insert(
                id,
                Series {
                    id,
                    title: title.to_string(),
                },
            );
        }

        for (id, title, published, author_id, series_id) in [
            (1, "The Fellowship of the Ring", date(1954, 7, 29), 1, Some(1)),
            (2, "The Two Towers", date(1954, 11, 11), 1, Some(1)),
            (3, "Return of the King", date(1955, 10, 20), 1, Some(1)),
            (4, "Harry Potter and the Philosopher's Stone", date(1997, 6, 26), 2, Some(2)),
            (5, "Harry Potter and the Chamber of Secrets", date(1998, 7, 2), 2, Some(2)),
            (6, "Harry Potter and the Prisoner of Azkaban", date(1999, 7, 8), 2, Some(2)),
            (7, "Harry Potter and the Goblet of Fire", date(2000, 7, 8), 2, Some(2)),
            (8, "Harry Potter and the Order of the Phoenix", date(2003, 6, 21), 2, Some(2)),
            (9, "Harry Potter and the Half-Blood Prince", date(2005, 7, 16), 2, Some(2)),
            (10, "Harry Potter and the Deathly Hallows", date(2007, 7, 21), 2, Some(2)),
            (11, "The Hobbit", date(1937, 9, 21), 1, None),
        ] {
            tables.books.insert(
                id,
                Book {
                    id,
                    title: title.to_string(),
                    date_published: published,
                    author_id: Some(author_id),
                    series_id,
                },
            );
        }

        for (ordering, title) in (1_u32..).zip(HOBBIT_CHAPTERS) {
            let id = 270 + u64::from(ordering);
            tables.chapters.insert(
                id,
                Chapter {
                    id,
                    title: title.to_string(),
                    ordering,
                    book_id: Some(11),
                },
            );
        }

        tables
    }

    fn next_id<T>(table: &BTreeMap<u64, T>) -> u64 {
        table.keys().next_back().map_or(1, |last| last + 1)
    }

    fn books_of(&self, filter: impl Fn(&Book) -> bool) -> Vec<Instance> {
        self.books
            .values()
            .filter(|book| filter(book))
            .map(|book| instance(book.clone()))
            .collect()
    }

    fn chapters_of(&self, book_id: u64) -> Vec<Instance> {
        let mut chapters: Vec<&Chapter> = self
            .chapters
            .values()
            .filter(|chapter| chapter.book_id == Some(book_id))
            .collect();
        chapters.sort_by_key(|chapter| (chapter.ordering, chapter.id));
        chapters.into_iter().map(|c| instance(c.clone())).collect()
    }

    fn author(&self, id: Option<u64>) -> Option<Instance> {
        id.and_then(|id| self.authors.get(&id))
            .map(|author| instance(author.clone()))
    }

    fn series(&self, id: Option<u64>) -> Option<Instance> {
        id.and_then(|id| self.series.get(&id))
            .map(|series| instance(series.clone()))
    }

    fn book(&self, id: Option<u64>) -> Option<Instance> {
        id.and_then(|id| self.books.get(&id))
            .map(|book| instance(book.clone()))
    }
}

/// In-memory store over the fantasy database.
///
/// Every read returns a snapshot of the row; writes go through the store.
#[derive(Debug)]
pub struct FantasyStore {
    tables: RwLock<Tables>,
}

impl Default for FantasyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FantasyStore {
    /// Creates a store seeded with the fantasy database.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::seeded()),
        }
    }

    /// Creates an empty store.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

fn unknown_field(model: &'static str, field: &str) -> StoreError {
    StoreError::UnknownField {
        model,
        field: field.to_string(),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> StoreResult<Value> {
    serde_json::to_value(value).map_err(|e| StoreError::Backend(e.into()))
}

fn parse_value<T: DeserializeOwned>(field: &str, value: Value) -> StoreResult<T> {
    serde_json::from_value(value).map_err(|e| StoreError::InvalidValue {
        field: field.to_string(),
        message: e.to_string(),
    })
}

fn parse_id(model: &'static str, id: &str) -> StoreResult<u64> {
    id.parse().map_err(|_| StoreError::ObjectNotFound {
        model,
        id: id.to_string(),
    })
}

fn one_target<T: Clone + 'static>(field: &str, value: Related) -> StoreResult<Option<T>> {
    match value {
        Related::ToOne(one) => one
            .map(|target| {
                target.downcast_ref::<T>().cloned().ok_or_else(|| StoreError::InvalidValue {
                    field: field.to_string(),
                    message: "related object has the wrong model".to_string(),
                })
            })
            .transpose(),
        Related::ToMany(_) => Err(StoreError::InvalidValue {
            field: field.to_string(),
            message: "expected a single related object".to_string(),
        }),
    }
}

fn many_ids<T: 'static>(field: &str, values: &[Instance], id_of: impl Fn(&T) -> u64) -> StoreResult<Vec<u64>> {
    values
        .iter()
        .map(|value| {
            value.downcast_ref::<T>().map(&id_of).ok_or_else(|| StoreError::InvalidValue {
                field: field.to_string(),
                message: "related object has the wrong model".to_string(),
            })
        })
        .collect()
}

impl Accessor for FantasyStore {
    fn id(&self, instance: &Instance) -> StoreResult<String> {
        Ok(match classify(instance)? {
            Model::Author(author) => author.id,
            Model::Book(book) => book.id,
            Model::Chapter(chapter) => chapter.id,
            Model::Series(series) => series.id,
        }
        .to_string())
    }

    fn attribute(&self, instance: &Instance, name: &str) -> StoreResult<Value> {
        match (classify(instance)?, name) {
            (Model::Author(author), "name") => Ok(json!(author.name)),
            (Model::Author(author), "date_of_birth") => to_json(&author.date_of_birth),
            (Model::Author(author), "date_of_death") => to_json(&author.date_of_death),
            (Model::Author(_), _) => Err(unknown_field("Author", name)),
            (Model::Book(book), "title") => Ok(json!(book.title)),
            (Model::Book(book), "date_published") => to_json(&book.date_published),
            (Model::Book(_), _) => Err(unknown_field("Book", name)),
            (Model::Chapter(chapter), "title") => Ok(json!(chapter.title)),
            (Model::Chapter(chapter), "ordering") => Ok(json!(chapter.ordering)),
            (Model::Chapter(_), _) => Err(unknown_field("Chapter", name)),
            (Model::Series(series), "title") => Ok(json!(series.title)),
            (Model::Series(_), _) => Err(unknown_field("Series", name)),
        }
    }

    fn related_ids(&self, instance: &Instance, relationship: &str) -> StoreResult<RelatedIds> {
        let ids = |related: Vec<Instance>| -> StoreResult<Vec<String>> {
            related.iter().map(|r| self.id(r)).collect()
        };
        match (classify(instance)?, relationship) {
            (Model::Book(book), "author") => Ok(RelatedIds::ToOne(book.author_id.map(|id| id.to_string()))),
            (Model::Book(book), "series") => Ok(RelatedIds::ToOne(book.series_id.map(|id| id.to_string()))),
            (Model::Chapter(chapter), "book") => {
                Ok(RelatedIds::ToOne(chapter.book_id.map(|id| id.to_string())))
            }
            _ => match self.related(instance, relationship)? {
                Related::ToMany(many) => Ok(RelatedIds::ToMany(ids(many)?)),
                Related::ToOne(one) => Ok(RelatedIds::ToOne(one.map(|r| self.id(&r)).transpose()?)),
            },
        }
    }

    fn related(&self, instance: &Instance, relationship: &str) -> StoreResult<Related> {
        let tables = self.tables.read();
        match (classify(instance)?, relationship) {
            (Model::Author(author), "books") => {
                Ok(Related::ToMany(tables.books_of(|book| book.author_id == Some(author.id))))
            }
            (Model::Author(_), _) => Err(unknown_field("Author", relationship)),
            (Model::Book(book), "author") => Ok(Related::ToOne(tables.author(book.author_id))),
            (Model::Book(book), "series") => Ok(Related::ToOne(tables.series(book.series_id))),
            (Model::Book(book), "chapters") => Ok(Related::ToMany(tables.chapters_of(book.id))),
            (Model::Book(_), _) => Err(unknown_field("Book", relationship)),
            (Model::Chapter(chapter), "book") => Ok(Related::ToOne(tables.book(chapter.book_id))),
            (Model::Chapter(_), _) => Err(unknown_field("Chapter", relationship)),
            (Model::Series(series), "books") => {
                Ok(Related::ToMany(tables.books_of(|book| book.series_id == Some(series.id))))
            }
            (Model::Series(_), _) => Err(unknown_field("Series", relationship)),
        }
    }
}

impl FantasyStore {
    fn apply_author(tables: &mut Tables, author: &mut Author, fields: Fields) -> StoreResult<()> {
        for (name, value) in fields {
            match (name.as_str(), value) {
                ("name", FieldValue::Attribute(v)) => author.name = parse_value(&name, v)?,
                ("date_of_birth", FieldValue::Attribute(v)) => author.date_of_birth = parse_value(&name, v)?,
                ("date_of_death", FieldValue::Attribute(v)) => author.date_of_death = parse_value(&name, v)?,
                ("books", FieldValue::Relationship(related)) => {
                    let ids = many_ids::<Book>(&name, &related.into_vec(), |b| b.id)?;
                    for book in tables.books.values_mut() {
                        if ids.contains(&book.id) {
                            book.author_id = Some(author.id);
                        } else if book.author_id == Some(author.id) {
                            book.author_id = None;
                        }
                    }
                }
                _ => return Err(unknown_field("Author", &name)),
            }
        }
        Ok(())
    }

    fn apply_book(tables: &mut Tables, book: &mut Book, fields: Fields) -> StoreResult<()> {
        for (name, value) in fields {
            match (name.as_str(), value) {
                ("title", FieldValue::Attribute(v)) => book.title = parse_value(&name, v)?,
                ("date_published", FieldValue::Attribute(v)) => book.date_published = parse_value(&name, v)?,
                ("author", FieldValue::Relationship(related)) => {
                    book.author_id = one_target::<Author>(&name, related)?.map(|a| a.id);
                }
                ("series", FieldValue::Relationship(related)) => {
                    book.series_id = one_target::<Series>(&name, related)?.map(|s| s.id);
                }
                ("chapters", FieldValue::Relationship(related)) => {
                    let ids = many_ids::<Chapter>(&name, &related.into_vec(), |c| c.id)?;
                    for chapter in tables.chapters.values_mut() {
                        if ids.contains(&chapter.id) {
                            chapter.book_id = Some(book.id);
                        } else if chapter.book_id == Some(book.id) {
                            chapter.book_id = None;
                        }
                    }
                }
                _ => return Err(unknown_field("Book", &name)),
            }
        }
        Ok(())
    }

    fn apply_chapter(chapter: &mut Chapter, fields: Fields) -> StoreResult<()> {
        for (name, value) in fields {
            match (name.as_str(), value) {
                ("title", FieldValue::Attribute(v)) => chapter.title = parse_value(&name, v)?,
                ("ordering", FieldValue::Attribute(v)) => chapter.ordering = parse_value(&name, v)?,
                ("book", FieldValue::Relationship(related)) => {
                    chapter.book_id = one_target::<Book>(&name, related)?.map(|b| b.id);
                }
                _ => return Err(unknown_field("Chapter", &name)),
            }
        }
        Ok(())
    }

    fn apply_series(tables: &mut Tables, series: &mut Series, fields: Fields) -> StoreResult<()> {
        for (name, value) in fields {
            match (name.as_str(), value) {
                ("title", FieldValue::Attribute(v)) => series.title = parse_value(&name, v)?,
                ("books", FieldValue::Relationship(related)) => {
                    let ids = many_ids::<Book>(&name, &related.into_vec(), |b| b.id)?;
                    for book in tables.books.values_mut() {
                        if ids.contains(&book.id) {
                            book.series_id = Some(series.id);
                        } else if book.series_id == Some(series.id) {
                            book.series_id = None;
                        }
                    }
                }
                _ => return Err(unknown_field("Series", &name)),
            }
        }
        Ok(())
    }
}

fn require_field(fields: &Fields, field: &str) -> StoreResult<()> {
    if fields.contains_key(field) {
        Ok(())
    } else {
        Err(StoreError::InvalidValue {
            field: field.to_string(),
            message: "is required".to_string(),
        })
    }
}

fn new_key<T>(table: &BTreeMap<u64, T>, model: &'static str, id: Option<&str>) -> StoreResult<u64> {
    let Some(id) = id else {
        return Ok(Tables::next_id(table));
    };
    let key = id.parse::<u64>().map_err(|_| StoreError::InvalidValue {
        field: "id".to_string(),
        message: format!("'{id}' is not a valid {model} id"),
    })?;
    if table.contains_key(&key) {
        return Err(StoreError::ObjectAlreadyExists {
            model,
            id: id.to_string(),
        });
    }
    Ok(key)
}

fn window(items: Vec<Instance>, pagination: Option<&Pagination>) -> Vec<Instance> {
    match pagination {
        Some(page) => items.into_iter().skip(page.offset()).take(page.limit()).collect(),
        None => items,
    }
}

impl Store for FantasyStore {
    fn fetch_one(&self, model: &ModelType, id: &str) -> StoreResult<Instance> {
        let tables = self.tables.read();
        let key = parse_id(model.name(), id)?;
        let found = if *model == ModelType::of::<Author>() {
            tables.authors.get(&key).map(|row| instance(row.clone()))
        } else if *model == ModelType::of::<Book>() {
            tables.books.get(&key).map(|row| instance(row.clone()))
        } else if *model == ModelType::of::<Chapter>() {
            tables.chapters.get(&key).map(|row| instance(row.clone()))
        } else if *model == ModelType::of::<Series>() {
            tables.series.get(&key).map(|row| instance(row.clone()))
        } else {
            return Err(StoreError::UnsupportedModel);
        };
        found.ok_or_else(|| StoreError::ObjectNotFound {
            model: model.name(),
            id: id.to_string(),
        })
    }

    fn fetch_many(&self, model: &ModelType, pagination: Option<&Pagination>) -> StoreResult<Vec<Instance>> {
        let tables = self.tables.read();
        let rows: Vec<Instance> = if *model == ModelType::of::<Author>() {
            tables.authors.values().map(|row| instance(row.clone())).collect()
        } else if *model == ModelType::of::<Book>() {
            tables.books.values().map(|row| instance(row.clone())).collect()
        } else if *model == ModelType::of::<Chapter>() {
            tables.chapters.values().map(|row| instance(row.clone())).collect()
        } else if *model == ModelType::of::<Series>() {
            tables.series.values().map(|row| instance(row.clone())).collect()
        } else {
            return Err(StoreError::UnsupportedModel);
        };
        Ok(window(rows, pagination))
    }

    fn count(&self, model: &ModelType) -> StoreResult<usize> {
        let tables = self.tables.read();
        if *model == ModelType::of::<Author>() {
            Ok(tables.authors.len())
        } else if *model == ModelType::of::<Book>() {
            Ok(tables.books.len())
        } else if *model == ModelType::of::<Chapter>() {
            Ok(tables.chapters.len())
        } else if *model == ModelType::of::<Series>() {
            Ok(tables.series.len())
        } else {
            Err(StoreError::UnsupportedModel)
        }
    }

    fn create(&self, model: &ModelType, id: Option<&str>, fields: Fields) -> StoreResult<Instance> {
        let mut tables = self.tables.write();
        let tables = &mut *tables;

        if *model == ModelType::of::<Author>() {
            require_field(&fields, "name")?;
            let mut author = Author {
                id: new_key(&tables.authors, "Author", id)?,
                name: String::new(),
                date_of_birth: None,
                date_of_death: None,
            };
            Self::apply_author(tables, &mut author, fields)?;
            tables.authors.insert(author.id, author.clone());
            Ok(instance(author))
        } else if *model == ModelType::of::<Book>() {
            require_field(&fields, "title")?;
            let mut book = Book {
                id: new_key(&tables.books, "Book", id)?,
                title: String::new(),
                date_published: None,
                author_id: None,
                series_id: None,
            };
            Self::apply_book(tables, &mut book, fields)?;
            tables.books.insert(book.id, book.clone());
            Ok(instance(book))
        } else if *model == ModelType::of::<Chapter>() {
            require_field(&fields, "title")?;
            let mut chapter = Chapter {
                id: new_key(&tables.chapters, "Chapter", id)?,
                title: String::new(),
                ordering: 0,
                book_id: None,
            };
            Self::apply_chapter(&mut chapter, fields)?;
            tables.chapters.insert(chapter.id, chapter.clone());
            Ok(instance(chapter))
        } else if *model == ModelType::of::<Series>() {
            require_field(&fields, "title")?;
            let mut series = Series {
                id: new_key(&tables.series, "Series", id)?,
                title: String::new(),
            };
            Self::apply_series(tables, &mut series, fields)?;
            tables.series.insert(series.id, series.clone());
            Ok(instance(series))
        } else {
            Err(StoreError::UnsupportedModel)
        }
    }

    fn update(&self, instance_ref: &Instance, fields: Fields) -> StoreResult<Instance> {
        let mut tables = self.tables.write();
        let tables = &mut *tables;
        let missing = |model: &'static str, id: u64| StoreError::ObjectNotFound {
            model,
            id: id.to_string(),
        };
        match classify(instance_ref)? {
            Model::Author(author) => {
                let mut row = tables.authors.get(&author.id).cloned().ok_or_else(|| missing("Author", author.id))?;
                Self::apply_author(tables, &mut row, fields)?;
                tables.authors.insert(row.id, row.clone());
                Ok(instance(row))
            }
            Model::Book(book) => {
                let mut row = tables.books.get(&book.id).cloned().ok_or_else(|| missing("Book", book.id))?;
                Self::apply_book(tables, &mut row, fields)?;
                tables.books.insert(row.id, row.clone());
                Ok(instance(row))
            }
            Model::Chapter(chapter) => {
                let mut row = tables.chapters.get(&chapter.id).cloned().ok_or_else(|| missing("Chapter", chapter.id))?;
                Self::apply_chapter(&mut row, fields)?;
                tables.chapters.insert(row.id, row.clone());
                Ok(instance(row))
            }
            Model::Series(series) => {
                let mut row = tables.series.get(&series.id).cloned().ok_or_else(|| missing("Series", series.id))?;
                Self::apply_series(tables, &mut row, fields)?;
                tables.series.insert(row.id, row.clone());
                Ok(instance(row))
            }
        }
    }

    fn create_relationship(&self, instance: &Instance, relationship: &str, values: Vec<Instance>) -> StoreResult<()> {
        let mut tables = self.tables.write();
        match (classify(instance)?, relationship) {
            (Model::Author(author), "books") => {
                for id in many_ids::<Book>(relationship, &values, |b| b.id)? {
                    if let Some(book) = tables.books.get_mut(&id) {
                        book.author_id = Some(author.id);
                    }
                }
            }
            (Model::Series(series), "books") => {
                for id in many_ids::<Book>(relationship, &values, |b| b.id)? {
                    if let Some(book) = tables.books.get_mut(&id) {
                        book.series_id = Some(series.id);
                    }
                }
            }
            (Model::Book(book), "chapters") => {
                for id in many_ids::<Chapter>(relationship, &values, |c| c.id)? {
                    if let Some(chapter) = tables.chapters.get_mut(&id) {
                        chapter.book_id = Some(book.id);
                    }
                }
            }
            _ => return Err(unknown_field("to-many relationship", relationship)),
        }
        Ok(())
    }

    fn delete_relationship(&self, instance: &Instance, relationship: &str, values: Vec<Instance>) -> StoreResult<()> {
        let mut tables = self.tables.write();
        match (classify(instance)?, relationship) {
            (Model::Author(author), "books") => {
                for id in many_ids::<Book>(relationship, &values, |b| b.id)? {
                    if let Some(book) = tables.books.get_mut(&id).filter(|b| b.author_id == Some(author.id)) {
                        book.author_id = None;
                    }
                }
            }
            (Model::Series(series), "books") => {
                for id in many_ids::<Book>(relationship, &values, |b| b.id)? {
                    if let Some(book) = tables.books.get_mut(&id).filter(|b| b.series_id == Some(series.id)) {
                        book.series_id = None;
                    }
                }
            }
            (Model::Book(book), "chapters") => {
                for id in many_ids::<Chapter>(relationship, &values, |c| c.id)? {
                    if let Some(chapter) = tables.chapters.get_mut(&id).filter(|c| c.book_id == Some(book.id)) {
                        chapter.book_id = None;
                    }
                }
            }
            _ => return Err(unknown_field("to-many relationship", relationship)),
        }
        Ok(())
    }
}

/// Registers the four fantasy resource types over `store`.
pub fn fantasy_resources(store: &Arc<FantasyStore>) -> Vec<ResourceDescriptor> {
    vec![
        ResourceDescriptor::builder("authors", ModelType::of::<Author>(), store.clone())
            .attributes(["name", "date_of_birth", "date_of_death"])
            .to_many("books", "books")
            .build(),
        ResourceDescriptor::builder("books", ModelType::of::<Book>(), store.clone())
            .attributes(["title", "date_published"])
            .to_one("author", "authors")
            .to_many("chapters", "chapters")
            .to_one("series", "series")
            .build(),
        ResourceDescriptor::builder("chapters", ModelType::of::<Chapter>(), store.clone())
            .attributes(["title", "ordering"])
            .to_one("book", "books")
            .build(),
        ResourceDescriptor::builder("series", ModelType::of::<Series>(), store.clone())
            .attribute("title")
            .to_many("books", "books")
            .build(),
    ]
}

/// A [`JsonApi`] over a freshly seeded [`FantasyStore`].
pub fn fantasy_api(base_url: &str) -> JsonApiResult<JsonApi> {
    fantasy_api_with_store(base_url, &Arc::new(FantasyStore::new()))
}

/// A [`JsonApi`] over the given store.
pub fn fantasy_api_with_store(base_url: &str, store: &Arc<FantasyStore>) -> JsonApiResult<JsonApi> {
    fantasy_resources(store)
        .into_iter()
        .fold(JsonApi::builder(base_url), |builder, descriptor| builder.resource(descriptor))
        .build()
}
