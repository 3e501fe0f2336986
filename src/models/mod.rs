// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Availability, CustomerPreferences, DietaryInfo, DietaryPreferences, HistoryItem, Ingredient, MenuCategory,
    MenuItem, MenuItemUpdate, NewMenuItem, Order, OrderHistoryEntry, OrderItem, OrderStatus, OrderType, PriceRange,
    Rating, ScoredCandidate, ScoringWeights, SpiceLevel,
};
pub use requests::{
    AskRequest, BreakdownQuery, CreateMenuItemRequest, CreateOrderRequest, MenuListQuery, OrderItemRequest,
    OrderListQuery, PopularItemsQuery, RateMenuItemRequest, RecommendationRequest, SalesQuery, UpdateMenuItemRequest,
    UpdateOrderStatusRequest,
};
pub use responses::{
    AnswerResponse, ApiResponse, EnhancedDescriptionResponse, ErrorResponse, FieldError, HealthResponse, Pagination,
    RecommendationResponse, RecommendedItem,
};
