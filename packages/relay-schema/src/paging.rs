//! Cursor pagination over an ordered sequence, and the `PageInfo` type.
//! See: https://graphql.org/learn/pagination/
//! See: https://relay.dev/graphql/connections.htm#sec-Pagination-algorithm

use crate::{RelayError, RelayResult};
use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputValue, Object, SchemaBuilder, TypeRef,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use extension_trait::extension_trait;
use std::ops::Range;

pub type Cursor = String;

const CURSOR_PREFIX: &str = "arrayconnection:";

/// Argument names owned by pagination.
pub const PAGINATION_ARGUMENTS: [&str; 4] = ["first", "after", "last", "before"];

pub fn offset_to_cursor(offset: usize) -> Cursor {
    STANDARD.encode(format!("{CURSOR_PREFIX}{offset}"))
}

pub fn cursor_to_offset(cursor: &str) -> Option<usize> {
    let bytes = STANDARD.decode(cursor).ok()?;
    let unbased = String::from_utf8(bytes).ok()?;
    unbased.strip_prefix(CURSOR_PREFIX)?.parse().ok()
}

/// Unreadable cursors fall back to `default`. Offsets beyond `i64::MAX`
/// saturate, which puts them past the end of any sequence.
fn offset_with_default(cursor: Option<&str>, default: i64) -> i64 {
    cursor
        .and_then(cursor_to_offset)
        .map(|offset| i64::try_from(offset).unwrap_or(i64::MAX))
        .unwrap_or(default)
}

/// The `first`/`last`/`after`/`before` arguments of a connection field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionArgs {
    pub first: Option<i64>,
    pub after: Option<Cursor>,
    pub last: Option<i64>,
    pub before: Option<Cursor>,
}

impl ConnectionArgs {
    pub fn first(mut self, first: i64) -> Self {
        self.first = Some(first);
        self
    }

    pub fn after(mut self, cursor: impl Into<Cursor>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    pub fn last(mut self, last: i64) -> Self {
        self.last = Some(last);
        self
    }

    pub fn before(mut self, cursor: impl Into<Cursor>) -> Self {
        self.before = Some(cursor.into());
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: Option<usize>,
    pub max_page_size: Option<usize>,
}

impl PageLimits {
    fn check(&self, argument: &'static str, value: Option<i64>) -> RelayResult<Option<i64>> {
        let Some(value) = value else {
            return Ok(None);
        };
        if value < 0 {
            return Err(RelayError::InvalidPaginationArgument {
                argument,
                reason: format!("must be a non-negative integer, got {value}"),
            });
        }
        if let Some(max) = self.max_page_size {
            if value as u64 > max as u64 {
                return Err(RelayError::InvalidPaginationArgument {
                    argument,
                    reason: format!("must not exceed {max}, got {value}"),
                });
            }
        }
        Ok(Some(value))
    }
}

/// See: https://relay.dev/graphql/connections.htm#sec-PageInfo
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<Cursor>,
    pub end_cursor: Option<Cursor>,
}

/// The slice of a sequence selected by a set of connection arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub range: Range<usize>,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl PageWindow {
    /// Select the window of a sequence of `len` items.
    pub fn select(len: usize, args: &ConnectionArgs, limits: &PageLimits) -> RelayResult<Self> {
        let mut first = limits.check("first", args.first)?;
        let last = limits.check("last", args.last)?;
        if first.is_none() && last.is_none() {
            first = limits.default_page_size.map(|size| size as i64);
        }

        let len = len as i64;
        let before_offset = offset_with_default(args.before.as_deref(), len);
        let after_offset = offset_with_default(args.after.as_deref(), -1);

        let mut start_offset = after_offset.max(-1).saturating_add(1);
        let mut end_offset = before_offset.min(len);
        if let Some(first) = first {
            end_offset = end_offset.min(start_offset.saturating_add(first));
        }
        if let Some(last) = last {
            start_offset = start_offset.max(end_offset.saturating_sub(last));
        }

        let lower_bound = if args.after.is_some() {
            after_offset.saturating_add(1)
        } else {
            0
        };
        let upper_bound = if args.before.is_some() { before_offset } else { len };

        let start = start_offset.clamp(0, len);
        let end = end_offset.clamp(start, len);

        Ok(Self {
            range: start as usize..end as usize,
            has_previous_page: last.is_some() && start_offset > lower_bound,
            has_next_page: first.is_some() && end_offset < upper_bound,
        })
    }

    pub fn page_info(&self) -> PageInfo {
        let cursors = !self.range.is_empty();
        PageInfo {
            has_next_page: self.has_next_page,
            has_previous_page: self.has_previous_page,
            start_cursor: cursors.then(|| offset_to_cursor(self.range.start)),
            end_cursor: cursors.then(|| offset_to_cursor(self.range.end - 1)),
        }
    }
}

#[extension_trait]
pub impl TypeRefPagingExt for TypeRef {
    const PAGE_INFO: &'static str = "PageInfo";
    const CURSOR: &'static str = "String";
}

#[extension_trait]
pub impl SchemaBuilderPagingExt for SchemaBuilder {
    fn register_paging_types(self) -> Self {
        let page_info_object = Object::new(TypeRef::PAGE_INFO)
            .description("Information about pagination in a connection.")
            .field(
                Field::new(
                    "hasNextPage",
                    TypeRef::named_nn(TypeRef::BOOLEAN),
                    |ctx| {
                        FieldFuture::new(async move {
                            let parent = ctx.parent_value.try_downcast_ref::<PageInfo>()?;
                            Ok(Some(FieldValue::value(parent.has_next_page)))
                        })
                    },
                )
                .description("When paginating forwards, are there more items?"),
            )
            .field(
                Field::new(
                    "hasPreviousPage",
                    TypeRef::named_nn(TypeRef::BOOLEAN),
                    |ctx| {
                        FieldFuture::new(async move {
                            let parent = ctx.parent_value.try_downcast_ref::<PageInfo>()?;
                            Ok(Some(FieldValue::value(parent.has_previous_page)))
                        })
                    },
                )
                .description("When paginating backwards, are there more items?"),
            )
            .field(
                Field::new("startCursor", TypeRef::named(TypeRef::CURSOR), |ctx| {
                    FieldFuture::new(async move {
                        let parent = ctx.parent_value.try_downcast_ref::<PageInfo>()?;
                        Ok(parent
                            .start_cursor
                            .clone()
                            .map(|cursor| FieldValue::value(cursor)))
                    })
                })
                .description("When paginating backwards, the cursor to continue."),
            )
            .field(
                Field::new("endCursor", TypeRef::named(TypeRef::CURSOR), |ctx| {
                    FieldFuture::new(async move {
                        let parent = ctx.parent_value.try_downcast_ref::<PageInfo>()?;
                        Ok(parent
                            .end_cursor
                            .clone()
                            .map(|cursor| FieldValue::value(cursor)))
                    })
                })
                .description("When paginating forwards, the cursor to continue."),
            );
        self.register(page_info_object)
    }
}

#[extension_trait]
pub impl FieldPagingExt for Field {
    /// Add pagination arguments to a field.
    /// See: https://relay.dev/graphql/connections.htm#sec-Arguments
    fn paging_arguments(self) -> Self {
        // Forward pagination arguments
        self.argument(
            InputValue::new("first", TypeRef::named(TypeRef::INT)).description(
                "Paginate forward, returning the given amount of edges at most.",
            ),
        )
        .argument(
            InputValue::new("after", TypeRef::named(TypeRef::CURSOR))
                .description("Return edges after the given cursor."),
        )
        // Backward pagination arguments
        .argument(
            InputValue::new("last", TypeRef::named(TypeRef::INT)).description(
                "Paginate backward, returning the given amount of edges at most.",
            ),
        )
        .argument(
            InputValue::new("before", TypeRef::named(TypeRef::CURSOR))
                .description("Return edges before the given cursor."),
        )
    }
}
