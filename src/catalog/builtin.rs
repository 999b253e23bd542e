//! Canonical derived-column rules and column layouts for each report.
//!
//! Destination names and column order follow the reports downloaded from the Ads console
//! and Seller Central, so the generated workbooks line up with existing spreadsheets.

use crate::processing::{ColumnRule, LookupTable, RenameSchema};
use crate::types::Value;

use super::{ProductType, ProductTypeConfig};

const CTR: &str = "Click-Thru Rate (CTR)";
const CPC: &str = "Cost Per Click (CPC)";
const VCPM: &str = "Cost per 1,000 viewable impressions (VCPM)";
const ACOS: &str = "Total Advertising Cost of Sales (ACOS)";
const ROAS: &str = "Total Return on Advertising Spend (ROAS)";
const ACOS_CLICK: &str = "Total Advertising Cost of Sales (ACOS) - (Click)";
const ROAS_CLICK: &str = "Total Return on Advertising Spend (ROAS) - (Click)";

/// Sponsored Products portfolio IDs and their console names.
const SP_PORTFOLIOS: &[(&str, &str)] = &[
    ("106981549316271", "Double Spend"),
    ("65755187546504", "W Underwear Everyday Cheeky Brief"),
    ("280492966857691", "M Tops Everyday SS V-Neck"),
    ("5063832534086", "W Tops Everyday Cami"),
    ("165024236637009", "M Tops Everyday SS Crew"),
    ("104816120666296", "M Underwear Classic Boxer"),
    ("259764919944753", "M Tops Everyday SS Henley"),
    ("38813994682763", "M Tops Everyday SS Button Up"),
    ("25893144515343", "W Bottoms Everyday Flex Legging Pocket"),
    ("116842281474380", "W Tops Everyday SS Henley"),
    ("3896807676598", "W Tops Pro-Knit Hoodie Zip"),
    ("73870559377363", "W Underwear Everyday Hipster"),
    ("44809391797534", "W Bottoms Longhaul Pants Weekender"),
    ("131285460150335", "M Bottoms Longhaul Pant Shop"),
    ("23115784546632", "Auto Tests"),
];
const NO_PORTFOLIO: &str = "No Portfolio";

pub(super) fn all() -> Vec<ProductTypeConfig> {
    vec![
        sponsored_products(),
        sponsored_display(),
        sponsored_brands(),
        sales_and_traffic(),
    ]
}

/// Maps each derived column onto itself, so the schema can interleave API and derived fields.
fn identity(schema: &mut RenameSchema, names: &[&str]) {
    for name in names {
        schema.push(*name, *name);
    }
}

fn sponsored_products() -> ProductTypeConfig {
    let portfolios = LookupTable::new(
        SP_PORTFOLIOS.iter().map(|&(id, name)| (id, Value::from(name))),
        Some(Value::from(NO_PORTFOLIO)),
    );
    let rules = vec![
        ColumnRule::lookup("Portfolio name", portfolios),
        ColumnRule::ratio("7 Day Conversion Rate", "purchases7d", "clicks"),
        ColumnRule::ratio(ACOS, "spend", "sales7d"),
    ];

    let mut schema = RenameSchema::new().with("date", "Date");
    identity(&mut schema, &["Portfolio name"]);
    schema = schema
        .with("campaignBudgetCurrencyCode", "Currency")
        .with("campaignName", "Campaign Name")
        .with("adGroupName", "Ad Group Name")
        .with("advertisedSku", "Advertised SKU")
        .with("advertisedAsin", "Advertised ASIN")
        .with("impressions", "Impressions")
        .with("clicks", "Clicks")
        .with("clickThroughRate", CTR)
        .with("costPerClick", CPC)
        .with("spend", "Spend")
        .with("sales7d", "7 Day Total Sales");
    identity(&mut schema, &[ACOS]);
    schema = schema
        .with("roasClicks7d", ROAS)
        .with("purchases7d", "7 Day Total Orders (#)")
        .with("unitsSoldClicks7d", "7 Day Total Units (#)");
    identity(&mut schema, &["7 Day Conversion Rate"]);
    schema = schema
        .with("unitsSoldSameSku7d", "7 Day Advertised SKU Units (#)")
        .with("unitsSoldOtherSku7d", "7 Day Other SKU Units (#)")
        // Trailing space matches the console export header.
        .with("attributedSalesSameSku7d", "7 Day Advertised SKU Sales ")
        .with("salesOtherSku7d", "7 Day Other SKU Sales");

    ProductTypeConfig::new(ProductType::SponsoredProducts, rules, schema)
}

fn sponsored_display() -> ProductTypeConfig {
    let rules = vec![
        ColumnRule::constant("Portfolio name", "-"),
        ColumnRule::constant("Cost Type", "CPC"),
        ColumnRule::constant("Bid Optimization", "SD_CONVERSIONS"),
        ColumnRule::ratio(CTR, "clicks", "impressions"),
        ColumnRule::ratio(CPC, "cost", "clicks"),
        // Not available from the v3 reporting API for SD; kept as an empty column.
        ColumnRule::constant(VCPM, ""),
        ColumnRule::ratio(ACOS, "cost", "sales"),
        ColumnRule::ratio(ROAS, "sales", "cost"),
        ColumnRule::ratio(ACOS_CLICK, "cost", "salesClicks"),
        ColumnRule::ratio(ROAS_CLICK, "salesClicks", "cost"),
    ];

    let mut schema = RenameSchema::new()
        .with("date", "Date")
        .with("campaignBudgetCurrencyCode", "Currency")
        .with("campaignName", "Campaign Name");
    identity(&mut schema, &["Portfolio name", "Cost Type"]);
    schema.push("adGroupName", "Ad Group Name");
    identity(&mut schema, &["Bid Optimization"]);
    schema = schema
        .with("promotedSku", "Advertised SKU")
        .with("promotedAsin", "Advertised ASIN")
        .with("impressions", "Impressions")
        .with("impressionsViews", "Viewable Impressions")
        .with("clicks", "Clicks");
    identity(&mut schema, &[CTR]);
    schema = schema
        .with("detailPageViews", "14 Day Detail Page Views (DPV)")
        .with("cost", "Spend");
    identity(&mut schema, &[CPC, VCPM, ACOS, ROAS]);
    schema = schema
        .with("purchases", "14 Day Total Orders (#)")
        .with("unitsSold", "14 Day Total Units (#)")
        .with("sales", "14 Day Total Sales")
        .with("newToBrandPurchases", "14 Day New-to-brand Orders (#)")
        .with("newToBrandSales", "14 Day New-to-brand Sales")
        .with("newToBrandUnitsSold", "14 Day New-to-brand Units (#)");
    identity(&mut schema, &[ACOS_CLICK, ROAS_CLICK]);
    schema = schema
        .with("purchasesClicks", "14 Day Total Orders (#) - (Click)")
        .with("unitsSoldClicks", "14 Day Total Units (#) - (Click)")
        .with("salesClicks", "14 Day Total Sales - (Click)")
        .with("newToBrandPurchasesClicks", "14 Day New-to-brand Orders (#) - (Click)")
        .with("newToBrandSalesClicks", "14 Day New-to-brand Sales - (Click)")
        .with("newToBrandUnitsSoldClicks", "14 Day New-to-brand Units (#) - (Click)");

    ProductTypeConfig::new(ProductType::SponsoredDisplay, rules, schema)
}

fn sponsored_brands() -> ProductTypeConfig {
    let rules = vec![
        ColumnRule::constant("Portfolio name", "Not grouped"),
        ColumnRule::ratio(CTR, "clicks", "impressions"),
        ColumnRule::ratio(CPC, "cost", "clicks"),
        ColumnRule::scaled_ratio(VCPM, 1000.0, "viewableImpressions", "cost"),
        ColumnRule::ratio(ACOS, "cost", "sales"),
        ColumnRule::ratio(ROAS, "sales", "cost"),
        ColumnRule::ratio("14 Day Conversion Rate", "purchases", "clicks"),
        ColumnRule::ratio(ACOS_CLICK, "cost", "salesClicks"),
        ColumnRule::ratio(ROAS_CLICK, "salesClicks", "cost"),
        ColumnRule::alias("14 Day Total Units (#) - (Click)", "unitsSold"),
    ];

    let mut schema = RenameSchema::new().with("date", "Date");
    identity(&mut schema, &["Portfolio name"]);
    schema = schema
        .with("campaignBudgetCurrencyCode", "Currency")
        .with("campaignName", "Campaign Name")
        .with("adGroupName", "Ad Group Name")
        .with("keywordText", "Targeting")
        .with("matchType", "Match Type")
        .with("searchTerm", "Customer Search Term")
        .with("costType", "Cost Type")
        .with("impressions", "Impressions")
        .with("viewableImpressions", "Viewable Impressions")
        .with("clicks", "Clicks");
    identity(&mut schema, &[CTR]);
    schema.push("cost", "Spend");
    identity(&mut schema, &[CPC, VCPM, ACOS, ROAS]);
    schema = schema
        .with("sales", "14 Day Total Sales")
        .with("purchases", "14 Day Total Orders (#)")
        .with("unitsSold", "14 Day Total Units (#)");
    identity(&mut schema, &["14 Day Conversion Rate", ACOS_CLICK, ROAS_CLICK]);
    schema = schema
        .with("salesClicks", "14 Day Total Sales - (Click)")
        .with("purchasesClicks", "14 Day Total Orders (#) - (Click)");
    identity(&mut schema, &["14 Day Total Units (#) - (Click)"]);

    ProductTypeConfig::new(ProductType::SponsoredBrands, rules, schema)
}

/// SP-API `GET_SALES_AND_TRAFFIC_REPORT` at child-ASIN granularity, after nested objects are
/// flattened into dot paths.
fn sales_and_traffic() -> ProductTypeConfig {
    const COLUMNS: &[(&str, &str)] = &[
        ("date", "Date"),
        ("parentAsin", "(Parent) ASIN"),
        ("childAsin", "(Child) ASIN"),
        ("trafficByAsin.mobileAppSessions", "Sessions - Mobile App"),
        ("trafficByAsin.mobileAppSessionsB2B", "Sessions - Mobile APP - B2B"),
        ("trafficByAsin.browserSessions", "Sessions - Browser"),
        ("trafficByAsin.browserSessionsB2B", "Sessions - Browser - B2B"),
        ("trafficByAsin.sessions", "Sessions - Total"),
        ("trafficByAsin.sessionsB2B", "Sessions - Total - B2B"),
        ("trafficByAsin.mobileAppSessionPercentage", "Session Percentage - Mobile App"),
        ("trafficByAsin.mobileAppSessionPercentageB2B", "Session Percentage - Mobile APP - B2B"),
        ("trafficByAsin.browserSessionPercentage", "Session Percentage - Browser"),
        ("trafficByAsin.browserSessionPercentageB2B", "Session Percentage - Browser - B2B"),
        ("trafficByAsin.sessionPercentage", "Session Percentage - Total"),
        ("trafficByAsin.sessionPercentageB2B", "Session Percentage - Total - B2B"),
        ("trafficByAsin.mobileAppPageViews", "Page Views - Mobile App"),
        ("trafficByAsin.mobileAppPageViewsB2B", "Page Views - Mobile APP - B2B"),
        ("trafficByAsin.browserPageViews", "Page Views - Browser"),
        ("trafficByAsin.browserPageViewsB2B", "Page Views - Browser - B2B"),
        ("trafficByAsin.pageViews", "Page Views - Total"),
        ("trafficByAsin.pageViewsB2B", "Page Views - Total - B2B"),
        ("trafficByAsin.mobileAppPageViewsPercentage", "Page Views Percentage - Mobile App"),
        ("trafficByAsin.mobileAppPageViewsPercentageB2B", "Page Views Percentage - Mobile App - B2B"),
        ("trafficByAsin.browserPageViewsPercentage", "Page Views Percentage - Browser"),
        ("trafficByAsin.browserPageViewsPercentageB2B", "Page Views Percentage - Browser - B2B"),
        ("trafficByAsin.pageViewsPercentage", "Page Views Percentage - Total"),
        ("trafficByAsin.pageViewsPercentageB2B", "Page Views Percentage - Total - B2B"),
        ("trafficByAsin.buyBoxPercentage", "Featured Offer (Buy Box) Percentage"),
        ("trafficByAsin.buyBoxPercentageB2B", "Featured Offer (Buy Box) Percentage - B2B"),
        ("salesByAsin.unitsOrdered", "Units Ordered"),
        ("salesByAsin.unitsOrderedB2B", "Units Ordered - B2B"),
        ("trafficByAsin.unitSessionPercentage", "Unit Session Percentage"),
        ("trafficByAsin.unitSessionPercentageB2B", "Unit Session Percentage - B2B"),
        ("salesByAsin.orderedProductSales.amount", "Ordered Product Sales"),
        ("salesByAsin.orderedProductSalesB2B.amount", "Ordered Product Sales - B2B"),
        ("salesByAsin.totalOrderItems", "Total Order Items"),
        ("salesByAsin.totalOrderItemsB2B", "Total Order Items - B2B"),
    ];

    ProductTypeConfig::new(
        ProductType::SalesAndTraffic,
        Vec::new(),
        COLUMNS.iter().copied().collect(),
    )
}
