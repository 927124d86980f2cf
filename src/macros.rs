//! 宏集合：`entity!` 声明实体元数据与列常量；`IntoStrings` 让原始片段接口接受不定长字符串参数。

/// 为 struct 实现 `Entity`，并为每个字段生成一个 `Column<Self>` 关联常量。
///
/// ```ignore
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct OrderItem { id: i64, unit_price: f64, note: String, cache: String }
///
/// halo_space::entity! {
///     #[table(name = "oi", schema = "sales")]
///     OrderItem {
///         const ID: id,
///         const UNIT_PRICE: unit_price { column: "price", updatable: false },
///         const NOTE: note { table: "oi_note" },
///         const CACHE: cache { transient: true },
///     }
/// }
/// ```
///
/// - `#[table(..)]` 可省略，省略时表名由类型名推导（`OrderItem` -> `order_item`）
/// - 字段属性可选：`column`、`table`、`transient`、`insertable`、`updatable`
/// - 字段名会在编译期校验，拼写错误的字段无法通过编译
/// - 用作过滤对象时，序列化出的每个键都必须在这里声明（不要用 serde 重命名字段）
#[macro_export]
macro_rules! entity {
    (
        $(#[table( $($tk:ident = $tv:expr),* $(,)? )])?
        $ty:ident {
            $(
                const $konst:ident : $field:ident $({ $($fk:ident : $fv:expr),* $(,)? })?
            ),* $(,)?
        }
    ) => {
        impl $crate::entity::Entity for $ty {
            const NAME: &'static str = stringify!($ty);
            $(
                const TABLE: $crate::entity::TableAttr = $crate::entity::TableAttr {
                    $($tk: $tv,)*
                    ..$crate::entity::TableAttr::NONE
                };
            )?
            const FIELDS: &'static [$crate::entity::FieldAttr] = &[
                $(
                    $crate::entity::FieldAttr {
                        $($($fk: $fv,)*)?
                        ..$crate::entity::FieldAttr::new(stringify!($field))
                    }
                ),*
            ];
        }

        #[allow(dead_code)]
        impl $ty {
            $(
                pub const $konst: $crate::column::Column<$ty> =
                    $crate::column::Column::new(stringify!($field));
            )*

            #[doc(hidden)]
            fn __entity_fields_exist(&self) {
                $( let _ = &self.$field; )*
            }
        }
    };
}

pub trait IntoStrings {
    fn extend_into_strings(self, dst: &mut Vec<String>);
}

impl IntoStrings for String {
    fn extend_into_strings(self, dst: &mut Vec<String>) {
        dst.push(self);
    }
}

impl IntoStrings for &str {
    fn extend_into_strings(self, dst: &mut Vec<String>) {
        dst.push(self.to_string());
    }
}

impl<const N: usize, T> IntoStrings for [T; N]
where
    T: Into<String>,
{
    fn extend_into_strings(self, dst: &mut Vec<String>) {
        dst.extend(self.into_iter().map(Into::into));
    }
}

impl<T> IntoStrings for &[T]
where
    T: Into<String> + Clone,
{
    fn extend_into_strings(self, dst: &mut Vec<String>) {
        for item in self {
            dst.push(item.clone().into());
        }
    }
}

impl<T> IntoStrings for Vec<T>
where
    T: Into<String>,
{
    fn extend_into_strings(self, dst: &mut Vec<String>) {
        dst.extend(self.into_iter().map(Into::into));
    }
}

#[doc(hidden)]
pub fn collect_into_strings<T>(value: T) -> Vec<String>
where
    T: IntoStrings,
{
    let mut dst = Vec::new();
    value.extend_into_strings(&mut dst);
    dst
}
