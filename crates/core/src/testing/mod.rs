//! Testing utilities and mock implementations.
//!
//! Mocks for every capability the resolver depends on, so the engine can be
//! exercised end to end without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use bookfinder_core::testing::{MockStrategy, MockCommentEnricher, fixtures};
//!
//! let strategy = Arc::new(MockStrategy::succeeding("douban_web", fixtures::book_record("活着")));
//! let enricher = Arc::new(MockCommentEnricher::with_comments(fixtures::comments(3)));
//!
//! // Build a Resolver with these and assert on call counts...
//! ```

mod mock_comment_enricher;
mod mock_http_client;
mod mock_strategy;

pub use mock_comment_enricher::{MockCommentEnricher, RecordedFetch};
pub use mock_http_client::MockHttpClient;
pub use mock_strategy::MockStrategy;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::resolver::{BookRecord, Comment, RecordSource};

    /// A Douban web record with a detail URL and rating.
    pub fn book_record(title: &str) -> BookRecord {
        let mut record = BookRecord::new(title, RecordSource::DoubanWeb);
        record.author = "余华".to_string();
        record.publisher = "作家出版社".to_string();
        record.rating = Some(9.4);
        record.url = Some("https://book.douban.com/subject/4913064/".to_string());
        record
    }

    /// `count` distinct comments.
    pub fn comments(count: usize) -> Vec<Comment> {
        (1..=count)
            .map(|i| Comment {
                content: format!("comment {}", i),
                author: format!("reader{}", i),
                rating: Some(((i - 1) % 5 + 1) as u8),
                useful_count: i as u32 * 10,
            })
            .collect()
    }

    /// Douban `/search` page with structured result blocks.
    ///
    /// Result links go through the `link2` redirector, so the raw body holds
    /// no plain subject URL.
    pub const DOUBAN_WEB_RESULTS: &str = r#"<!DOCTYPE html>
<html><head><title>搜索: 活着</title></head>
<body>
<div class="search-result">
  <div class="result-list">
    <div class="result">
      <div class="pic"><a href="https://www.douban.com/link2/?url=https%3A%2F%2Fbook.douban.com%2Fsubject%2F4913064%2F&amp;query=%E6%B4%BB%E7%9D%80"><img src="s1.jpg"></a></div>
      <div class="content">
        <div class="title">
          <h3><span>[书籍]</span>&nbsp;<a href="https://www.douban.com/link2/?url=https%3A%2F%2Fbook.douban.com%2Fsubject%2F4913064%2F&amp;query=%E6%B4%BB%E7%9D%80">活着</a></h3>
          <div class="rating-info">
            <span class="allstar45"></span>
            <span class="rating_nums">9.4</span>
            <span>(812345人评价)</span>
            <span class="subject-cast">余华 / 作家出版社 / 2012</span>
          </div>
        </div>
        <p>《活着》讲述了农村人福贵悲惨的人生遭遇。</p>
      </div>
    </div>
    <div class="result">
      <div class="content">
        <div class="title">
          <h3><span>[书籍]</span>&nbsp;<a href="https://www.douban.com/link2/?url=https%3A%2F%2Fbook.douban.com%2Fsubject%2F35073839%2F">直抵人心的写作</a></h3>
          <div class="rating-info">
            <span class="rating_nums">8.1</span>
            <span class="subject-cast">毕飞宇 / 人民文学出版社 / 2020</span>
          </div>
        </div>
      </div>
    </div>
  </div>
</div>
</body></html>"#;

    /// Douban page without result blocks; books appear only as subject links.
    pub const DOUBAN_WEB_LINKS_ONLY: &str = r#"<!DOCTYPE html>
<html><body>
<ul class="list">
  <li class="item">
    <div class="info">
      <a href="https://book.douban.com/subject/6082808/">百年孤独</a>
      <div class="meta">
        <span class="rating_nums">9.3</span>
        <span class="subject-cast">加西亚·马尔克斯 / 南海出版公司 / 2011</span>
      </div>
    </div>
  </li>
</ul>
</body></html>"#;

    /// Douban page that mentions a book only in text.
    pub const DOUBAN_WEB_TEXT_ONLY: &str = r#"<!DOCTYPE html>
<html><body>
<div class="mod">
  <p>刘慈欣的三体三部曲</p>
  <div data-subject="https://book.douban.com/subject/2567698/"></div>
</div>
</body></html>"#;

    /// Douban Books `/subject_search` page.
    pub const DOUBAN_BOOK_RESULTS: &str = r#"<!DOCTYPE html>
<html><body>
<ul class="subject-list">
  <li class="subject-item">
    <div class="pic"><a class="nbg" href="https://book.douban.com/subject/4913064/"><img src="s1.jpg"></a></div>
    <div class="info">
      <h2><a href="https://book.douban.com/subject/4913064/" title="活着">活着</a></h2>
      <div class="pub">余华 / 作家出版社 / 2012-8-1 / 20.00元</div>
      <div class="star clearfix"><span class="allstar45"></span><span class="rating_nums">9.4</span></div>
    </div>
  </li>
  <li class="subject-item">
    <div class="pic"><a class="nbg" href="/subject/1449351/"><img src="s2.jpg"></a></div>
    <div class="info">
      <h2><a href="/subject/1449351/" title="许三观卖血记">许三观卖血记</a></h2>
      <div class="pub">余华 / 作家出版社 / 2012-9</div>
    </div>
  </li>
</ul>
</body></html>"#;

    /// Douban book detail page with four comment items, one of them empty.
    pub const DOUBAN_COMMENTS_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<div id="comment-list-wrapper">
  <div class="comment-item">
    <div class="comment">
      <h3>
        <span class="comment-vote"><span class="vote-count">1024</span></span>
        <span class="comment-info">
          <a class="name" href="https://www.douban.com/people/reader-a/">读者甲</a>
          <span class="user-stars allstar50rating rating" title="力荐"></span>
        </span>
      </h3>
      <p class="comment-content"><span class="short">活着本身就是意义。</span></p>
    </div>
  </div>
  <div class="comment-item">
    <div class="comment">
      <h3>
        <span class="comment-vote"><span class="vote-count">12</span></span>
        <span class="comment-info">
          <a href="https://www.douban.com/people/reader-b/">读者乙</a>
          <span class="user-stars allstar40rating rating" title="推荐"></span>
        </span>
      </h3>
      <p class="comment-content"><span class="short">平静的叙述，沉重的故事。</span></p>
    </div>
  </div>
  <div class="comment-item">
    <div class="comment">
      <h3><span class="comment-info"><a class="name" href="https://www.douban.com/people/reader-c/">读者丙</a></span></h3>
      <p class="comment-content"><span class="short">   </span></p>
    </div>
  </div>
  <div class="comment-item">
    <div class="comment">
      <h3><span class="comment-info"><a class="name" href="https://www.douban.com/people/reader-d/">读者丁</a></span></h3>
      <p class="comment-content"><span class="short">读完很久说不出话。</span></p>
    </div>
  </div>
</div>
</body></html>"#;

    /// Open Library `search.json` response.
    pub const OPEN_LIBRARY_RESULTS: &str = r#"{
  "numFound": 2,
  "docs": [
    {
      "key": "/works/OL17618370W",
      "title": "Clean Code",
      "author_name": ["Robert C. Martin"],
      "publisher": ["Prentice Hall", "Pearson"]
    },
    {
      "key": "/works/OL20994337W",
      "title": "Clean Architecture",
      "author_name": ["Robert C. Martin"]
    }
  ]
}"#;

    pub const GOOGLE_BOOKS_RESULTS: &str = r#"{
  "kind": "books#volumes",
  "totalItems": 2,
  "items": [
    {
      "id": "abc123",
      "volumeInfo": {
        "title": "活着",
        "authors": ["余华"],
        "publisher": "作家出版社",
        "publishedDate": "2012-08",
        "averageRating": 4.5,
        "infoLink": "http://books.google.com/books?id=abc123"
      }
    },
    {
      "id": "def456",
      "volumeInfo": {
        "title": "许三观卖血记"
      }
    }
  ]
}"#;
}
