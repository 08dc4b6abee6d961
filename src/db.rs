use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};

use crate::config::SourceConfig;
use crate::models::{
    total_pages, Article, ArticleWithSource, NewArticle, NewSource, NewStory, Source, StoriesPage,
    Story, StoryArticle, StoryResponse,
};

#[derive(Debug, Clone, FromRow)]
struct SourceRow {
    id: i64,
    name: String,
    url: String,
    bias_rating: String,
    logo_url: Option<String>,
    is_active: bool,
}

#[derive(Debug, Clone, FromRow)]
struct StoryRow {
    id: i64,
    headline: String,
    summary: String,
    topic: String,
    key_facts: String,
    divergence_summary: Option<String>,
    status: String,
    published_at: Option<String>,
    created_at: String,
}

/// One `story_articles` link joined with its article and source.
#[derive(Debug, Clone, FromRow)]
struct StoryArticleRow {
    link_id: i64,
    story_id: i64,
    source_snippet: Option<String>,
    article_id: i64,
    article_title: String,
    article_url: String,
    article_snippet: Option<String>,
    article_published_at: Option<String>,
    article_created_at: String,
    source_id: i64,
    source_name: String,
    source_url: String,
    source_bias_rating: String,
    source_logo_url: Option<String>,
    source_is_active: bool,
}

impl TryFrom<SourceRow> for Source {
    type Error = anyhow::Error;

    fn try_from(row: SourceRow) -> anyhow::Result<Self> {
        Ok(Source {
            id: row.id,
            name: row.name,
            url: row.url,
            bias_rating: row.bias_rating.parse()?,
            logo_url: row.logo_url,
            is_active: row.is_active,
        })
    }
}

impl TryFrom<StoryRow> for Story {
    type Error = anyhow::Error;

    fn try_from(row: StoryRow) -> anyhow::Result<Self> {
        Ok(Story {
            id: row.id,
            headline: row.headline,
            summary: row.summary,
            topic: row.topic,
            key_facts: serde_json::from_str(&row.key_facts)?,
            divergence_summary: row.divergence_summary,
            status: row.status.parse()?,
            published_at: parse_optional_timestamp(row.published_at.as_deref())?,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl TryFrom<StoryArticleRow> for StoryArticle {
    type Error = anyhow::Error;

    fn try_from(row: StoryArticleRow) -> anyhow::Result<Self> {
        let source = Source {
            id: row.source_id,
            name: row.source_name,
            url: row.source_url,
            bias_rating: row.source_bias_rating.parse()?,
            logo_url: row.source_logo_url,
            is_active: row.source_is_active,
        };
        let article = Article {
            id: row.article_id,
            source_id: row.source_id,
            title: row.article_title,
            url: row.article_url,
            snippet: row.article_snippet,
            published_at: parse_optional_timestamp(row.article_published_at.as_deref())?,
            created_at: parse_timestamp(&row.article_created_at)?,
        };

        Ok(StoryArticle {
            id: row.link_id,
            story_id: row.story_id,
            article_id: row.article_id,
            source_snippet: row.source_snippet,
            article: ArticleWithSource { article, source },
        })
    }
}

// Fixed-width UTC timestamps so that TEXT ordering matches time ordering.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

fn parse_optional_timestamp(s: Option<&str>) -> anyhow::Result<Option<DateTime<Utc>>> {
    s.map(parse_timestamp).transpose()
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Every connection to an in-memory database is a separate database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sources (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                bias_rating TEXT NOT NULL,
                logo_url TEXT,
                is_active INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY,
                source_id INTEGER NOT NULL REFERENCES sources(id),
                title TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                snippet TEXT,
                published_at TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stories (
                id INTEGER PRIMARY KEY,
                headline TEXT NOT NULL,
                summary TEXT NOT NULL,
                topic TEXT NOT NULL,
                key_facts TEXT NOT NULL DEFAULT '[]',
                divergence_summary TEXT,
                status TEXT NOT NULL DEFAULT 'draft',
                published_at TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS story_articles (
                id INTEGER PRIMARY KEY,
                story_id INTEGER NOT NULL REFERENCES stories(id),
                article_id INTEGER NOT NULL REFERENCES articles(id),
                source_snippet TEXT,
                UNIQUE(story_id, article_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_stories_topic_published
            ON stories(topic, published_at DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upsert the configured sources, keyed by URL.
    pub async fn sync_sources(&self, configs: &[SourceConfig]) -> anyhow::Result<()> {
        for config in configs {
            sqlx::query(
                r#"
                INSERT INTO sources (name, url, bias_rating, logo_url, is_active)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(url) DO UPDATE SET
                    name = excluded.name,
                    bias_rating = excluded.bias_rating,
                    logo_url = excluded.logo_url,
                    is_active = excluded.is_active
                "#,
            )
            .bind(&config.name)
            .bind(&config.url)
            .bind(config.bias_rating.as_str())
            .bind(config.logo_url.as_deref())
            .bind(config.is_active)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn create_source(&self, source: NewSource) -> anyhow::Result<Source> {
        let result = sqlx::query(
            r#"
            INSERT INTO sources (name, url, bias_rating, logo_url, is_active)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&source.name)
        .bind(&source.url)
        .bind(source.bias_rating.as_str())
        .bind(source.logo_url.as_deref())
        .bind(source.is_active)
        .execute(&self.pool)
        .await?;

        Ok(Source {
            id: result.last_insert_rowid(),
            name: source.name,
            url: source.url,
            bias_rating: source.bias_rating,
            logo_url: source.logo_url,
            is_active: source.is_active,
        })
    }

    pub async fn get_sources(&self) -> anyhow::Result<Vec<Source>> {
        let rows = sqlx::query_as::<_, SourceRow>("SELECT * FROM sources ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Source::try_from).collect()
    }

    pub async fn get_source(&self, source_id: i64) -> anyhow::Result<Option<Source>> {
        let row = sqlx::query_as::<_, SourceRow>("SELECT * FROM sources WHERE id = ?")
            .bind(source_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Source::try_from).transpose()
    }

    pub async fn create_article(&self, article: NewArticle) -> anyhow::Result<Article> {
        let created_at = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO articles (source_id, title, url, snippet, published_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(article.source_id)
        .bind(&article.title)
        .bind(&article.url)
        .bind(article.snippet.as_deref())
        .bind(article.published_at.map(format_timestamp))
        .bind(format_timestamp(created_at))
        .execute(&self.pool)
        .await?;

        Ok(Article {
            id: result.last_insert_rowid(),
            source_id: article.source_id,
            title: article.title,
            url: article.url,
            snippet: article.snippet,
            published_at: article.published_at,
            created_at,
        })
    }

    pub async fn create_story(&self, story: NewStory) -> anyhow::Result<Story> {
        let created_at = Utc::now();
        let key_facts = serde_json::to_string(&story.key_facts)?;
        let result = sqlx::query(
            r#"
            INSERT INTO stories
                (headline, summary, topic, key_facts, divergence_summary, status, published_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&story.headline)
        .bind(&story.summary)
        .bind(&story.topic)
        .bind(&key_facts)
        .bind(story.divergence_summary.as_deref())
        .bind(story.status.as_str())
        .bind(story.published_at.map(format_timestamp))
        .bind(format_timestamp(created_at))
        .execute(&self.pool)
        .await?;

        Ok(Story {
            id: result.last_insert_rowid(),
            headline: story.headline,
            summary: story.summary,
            topic: story.topic,
            key_facts: story.key_facts,
            divergence_summary: story.divergence_summary,
            status: story.status,
            published_at: story.published_at,
            created_at,
        })
    }

    /// Link an article to a story. Relinking the same pair replaces the snippet.
    pub async fn link_article_to_story(
        &self,
        story_id: i64,
        article_id: i64,
        source_snippet: Option<&str>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO story_articles (story_id, article_id, source_snippet)
            VALUES (?, ?, ?)
            ON CONFLICT(story_id, article_id) DO UPDATE SET
                source_snippet = excluded.source_snippet
            "#,
        )
        .bind(story_id)
        .bind(article_id)
        .bind(source_snippet)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Count published stories, optionally restricted to one topic.
    pub async fn count_stories(&self, topic: Option<&str>) -> anyhow::Result<i64> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM stories
            WHERE status = 'published' AND (? IS NULL OR topic = ?)
            "#,
        )
        .bind(topic)
        .bind(topic)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0)
    }

    /// One page of published stories, newest first. `page` is 1-based.
    pub async fn get_stories(
        &self,
        page: i64,
        limit: i64,
        topic: Option<&str>,
    ) -> anyhow::Result<StoriesPage> {
        let page = page.max(1);
        let limit = limit.max(1);
        let offset = (page - 1).saturating_mul(limit);

        let total = self.count_stories(topic).await?;

        let rows = sqlx::query_as::<_, StoryRow>(
            r#"
            SELECT * FROM stories
            WHERE status = 'published' AND (? IS NULL OR topic = ?)
            ORDER BY published_at DESC NULLS LAST, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(topic)
        .bind(topic)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut stories = Vec::with_capacity(rows.len());
        for row in rows {
            let story = Story::try_from(row)?;
            let story_articles = self.get_story_articles(story.id).await?;
            stories.push(StoryResponse {
                story,
                story_articles,
            });
        }

        Ok(StoriesPage {
            stories,
            total,
            current_page: page,
            total_pages: total_pages(total, limit),
        })
    }

    pub async fn get_story(&self, story_id: i64) -> anyhow::Result<Option<StoryResponse>> {
        let row = sqlx::query_as::<_, StoryRow>("SELECT * FROM stories WHERE id = ?")
            .bind(story_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let story = Story::try_from(row)?;
        let story_articles = self.get_story_articles(story.id).await?;
        Ok(Some(StoryResponse {
            story,
            story_articles,
        }))
    }

    async fn get_story_articles(&self, story_id: i64) -> anyhow::Result<Vec<StoryArticle>> {
        let rows = sqlx::query_as::<_, StoryArticleRow>(
            r#"
            SELECT
                sa.id AS link_id,
                sa.story_id AS story_id,
                sa.source_snippet AS source_snippet,
                a.id AS article_id,
                a.title AS article_title,
                a.url AS article_url,
                a.snippet AS article_snippet,
                a.published_at AS article_published_at,
                a.created_at AS article_created_at,
                s.id AS source_id,
                s.name AS source_name,
                s.url AS source_url,
                s.bias_rating AS source_bias_rating,
                s.logo_url AS source_logo_url,
                s.is_active AS source_is_active
            FROM story_articles sa
            JOIN articles a ON a.id = sa.article_id
            JOIN sources s ON s.id = a.source_id
            WHERE sa.story_id = ?
            ORDER BY sa.id
            "#,
        )
        .bind(story_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StoryArticle::try_from).collect()
    }
}
