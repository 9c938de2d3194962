use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    dto::products::{BrandList, CategoryList},
    entity::{
        brands::{Column as BrandCol, Entity as Brands},
        categories::{Column as CategoryCol, Entity as Categories},
    },
    error::AppResult,
    models::{Brand, Category},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = Categories::find()
        .filter(CategoryCol::IsActive.eq(true))
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::empty()),
    ))
}

pub async fn list_brands(state: &AppState) -> AppResult<ApiResponse<BrandList>> {
    let items = Brands::find()
        .filter(BrandCol::IsActive.eq(true))
        .order_by_asc(BrandCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Brand::from)
        .collect();
    Ok(ApiResponse::success(
        "Brands",
        BrandList { items },
        Some(Meta::empty()),
    ))
}
