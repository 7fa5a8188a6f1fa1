//! 分页类型

use serde::{Deserialize, Serialize};

/// 分页响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    /// 数据列表
    pub data: Vec<T>,
    /// 总记录数
    pub total: u64,
    /// 当前页码 (从 1 开始)
    pub page: u32,
    /// 每页数量
    pub limit: u32,
    /// 总页数
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit > 0 {
            total.div_ceil(limit as u64) as u32
        } else {
            1
        };

        Self {
            data,
            total,
            page,
            limit,
            total_pages,
        }
    }

    /// 创建单页响应 (不分页时使用)
    pub fn single_page(data: Vec<T>) -> Self {
        let total = data.len() as u64;
        Self {
            data,
            total,
            page: 1,
            limit: total as u32,
            total_pages: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_response() {
        let items = vec!["a", "b", "c"];
        let resp = PaginatedResponse::new(items, 101, 2, 10);

        assert_eq!(resp.total, 101);
        assert_eq!(resp.page, 2);
        assert_eq!(resp.total_pages, 11);
    }

    #[test]
    fn test_single_page() {
        let resp = PaginatedResponse::single_page(vec![1, 2]);
        assert_eq!(resp.total, 2);
        assert_eq!(resp.total_pages, 1);
    }

    #[test]
    fn test_empty_result() {
        let resp = PaginatedResponse::<u8>::new(vec![], 0, 1, 20);
        assert_eq!(resp.total_pages, 0);
    }
}
