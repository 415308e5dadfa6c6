/// 상품 조회 (평균 입찰가, 입찰 수는 bids 테이블에서 계산)
pub const GET_ITEM: &str = r#"
    SELECT i.id, i.name,
           i.initial_price, i.initialprice_amount, i.initialprice_currency,
           i.buy_now_price, i.buynowprice_amount, i.buynowprice_currency,
           i.last_modified, i.verified, i.imperial_weight,
           i.dimension_name, i.dimension_symbol, i.depth, i.height, i.width,
           i.weight_name, i.weight_symbol, i.weight_value,
           (SELECT avg(b.amount) FROM bids b WHERE b.item_id = i.id) AS average_bid_amount,
           (SELECT count(*) FROM bids b WHERE b.item_id = i.id) AS number_of_bids
    FROM items i
    WHERE i.id = $1
"#;

/// 모든 상품 조회
pub const GET_ALL_ITEMS: &str = r#"
    SELECT i.id, i.name,
           i.initial_price, i.initialprice_amount, i.initialprice_currency,
           i.buy_now_price, i.buynowprice_amount, i.buynowprice_currency,
           i.last_modified, i.verified, i.imperial_weight,
           i.dimension_name, i.dimension_symbol, i.depth, i.height, i.width,
           i.weight_name, i.weight_symbol, i.weight_value,
           (SELECT avg(b.amount) FROM bids b WHERE b.item_id = i.id) AS average_bid_amount,
           (SELECT count(*) FROM bids b WHERE b.item_id = i.id) AS number_of_bids
    FROM items i
    ORDER BY i.id
"#;

/// 상품 이미지 조회
pub const GET_ITEM_IMAGES: &str =
    "SELECT file_name FROM images WHERE item_id = $1 ORDER BY file_name";

/// 모든 이미지 조회
pub const GET_ALL_IMAGES: &str = "SELECT item_id, file_name FROM images ORDER BY item_id, file_name";

/// 상품 입찰 조회
pub const GET_ITEM_BIDS: &str = r#"
    SELECT id, item_id, bidder_id, amount, bid_time
    FROM bids
    WHERE item_id = $1
    ORDER BY bid_time DESC, id DESC
"#;

/// 모든 입찰 조회
pub const GET_ALL_BIDS: &str =
    "SELECT id, item_id, bidder_id, amount, bid_time FROM bids ORDER BY item_id, id";

/// 이미지 BLOB 조회
pub const GET_IMAGE_BLOB: &str = "SELECT image_blob FROM items WHERE id = $1";

/// 설명 CLOB 조회
pub const GET_DESCRIPTION: &str = "SELECT description_clob FROM items WHERE id = $1";
