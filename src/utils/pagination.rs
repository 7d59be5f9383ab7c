//! 分页参数与响应包装

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// 查询串里的分页参数 (page 从 1 开始)
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

/// 解析后的分页参数
#[derive(Debug, Clone)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
    pub search: String,
}

impl PageQuery {
    /// 非法取值 (page/limit < 1) 视为请求错误
    pub fn parse(self) -> Result<PageParams, ()> {
        let page = self.page.unwrap_or(1);
        let mut limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if page < 1 || limit < 1 {
            return Err(());
        }
        if limit > MAX_LIMIT {
            limit = MAX_LIMIT;
        }
        Ok(PageParams {
            page,
            limit,
            offset: (page - 1) * limit,
            search: self.search.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub limit: i64,
    pub page: i64,
    pub pages: i64,
    pub search: String,
    pub total: i64,
}

/// 分页列表响应: `{"data": [...], "pagination": {...}}`
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, params: &PageParams) -> Self {
        let mut pages = (total + params.limit - 1) / params.limit;
        if pages == 0 {
            pages = 1;
        }
        Self {
            data,
            pagination: PageMeta {
                limit: params.limit,
                page: params.page,
                pages,
                search: params.search.clone(),
                total,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let params = PageQuery {
            page: None,
            limit: None,
            search: None,
        }
        .parse()
        .unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, DEFAULT_LIMIT);
        assert_eq!(params.offset, 0);
        assert_eq!(params.search, "");
    }

    #[test]
    fn test_parse_caps_limit() {
        let params = PageQuery {
            page: Some(3),
            limit: Some(1000),
            search: Some("abc".to_string()),
        }
        .parse()
        .unwrap();
        assert_eq!(params.limit, MAX_LIMIT);
        assert_eq!(params.offset, 2 * MAX_LIMIT);
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(PageQuery {
            page: Some(0),
            limit: None,
            search: None
        }
        .parse()
        .is_err());
        assert!(PageQuery {
            page: None,
            limit: Some(-5),
            search: None
        }
        .parse()
        .is_err());
    }

    #[test]
    fn test_paginated_pages() {
        let params = PageQuery {
            page: Some(1),
            limit: Some(10),
            search: None,
        }
        .parse()
        .unwrap();
        let resp = Paginated::new(vec![1, 2, 3], 25, &params);
        assert_eq!(resp.pagination.pages, 3);

        let empty: Paginated<i32> = Paginated::new(vec![], 0, &params);
        assert_eq!(empty.pagination.pages, 1);
    }
}
