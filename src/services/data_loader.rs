use crate::models::{Attribute, Listing};
use crate::units::parse_sol;

pub mod initial_data {
    use super::*;

    pub const DEMO_SELLER: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

    const DAY_MS: i64 = 86_400_000;

    struct DemoItem {
        mint: &'static str,
        price: &'static str,
        image: &'static str,
        name: &'static str,
        symbol: &'static str,
        description: &'static str,
        attributes: [(&'static str, &'static str); 3],
        verified: bool,
    }

    const DEMO_ITEMS: [DemoItem; 6] = [
        DemoItem {
            mint: "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU",
            price: "0.5",
            image: "https://images.unsplash.com/photo-1618005182384-a83a8bd57fbe?w=400&h=400&fit=crop",
            name: "Cosmic Dreamer #1",
            symbol: "COSMIC",
            description: "A mesmerizing digital artwork featuring cosmic elements and vibrant colors.",
            attributes: [("Background", "Cosmic"), ("Rarity", "Legendary"), ("Edition", "1/100")],
            verified: true,
        },
        DemoItem {
            mint: "8xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsV",
            price: "1.2",
            image: "https://images.unsplash.com/photo-1578662996442-48f60103fc96?w=400&h=400&fit=crop",
            name: "Neon City #42",
            symbol: "NEON",
            description: "Cyberpunk-inspired cityscape with neon lights and futuristic architecture.",
            attributes: [("Style", "Cyberpunk"), ("Rarity", "Epic"), ("Edition", "42/500")],
            verified: true,
        },
        DemoItem {
            mint: "9xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsW",
            price: "0.8",
            image: "https://images.unsplash.com/photo-1558618666-fcd25c85cd64?w=400&h=400&fit=crop",
            name: "Abstract Harmony #7",
            symbol: "ABSTR",
            description: "Abstract composition with flowing lines and harmonious color palette.",
            attributes: [("Style", "Abstract"), ("Rarity", "Rare"), ("Edition", "7/250")],
            verified: false,
        },
        DemoItem {
            mint: "AxKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsX",
            price: "2.5",
            image: "https://images.unsplash.com/photo-1541961017774-22349e4a1262?w=400&h=400&fit=crop",
            name: "Digital Portrait #15",
            symbol: "PORT",
            description: "Stunning digital portrait with intricate details and emotional depth.",
            attributes: [("Category", "Portrait"), ("Rarity", "Legendary"), ("Edition", "15/50")],
            verified: true,
        },
        DemoItem {
            mint: "BxKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsY",
            price: "0.3",
            image: "https://images.unsplash.com/photo-1611224923853-80b023f02d71?w=400&h=400&fit=crop",
            name: "Minimalist Geometry #23",
            symbol: "MIN",
            description: "Clean geometric shapes with minimalist design principles.",
            attributes: [("Style", "Minimalist"), ("Rarity", "Common"), ("Edition", "23/1000")],
            verified: false,
        },
        DemoItem {
            mint: "CxKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsZ",
            price: "1.8",
            image: "https://images.unsplash.com/photo-1578662996442-48f60103fc96?w=400&h=400&fit=crop",
            name: "Futuristic Landscape #8",
            symbol: "FUTURE",
            description: "Imaginative landscape with futuristic elements and vibrant colors.",
            attributes: [("Category", "Landscape"), ("Rarity", "Epic"), ("Edition", "8/300")],
            verified: true,
        },
    ];

    /// Demo catalog, one day apart, newest first, all offered by [`DEMO_SELLER`].
    pub fn demo_listings(now: i64) -> Vec<Listing> {
        DEMO_ITEMS
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                let price = parse_sol(item.price).ok()?;

                Some(Listing {
                    id: (i + 1).to_string(),
                    mint: item.mint.to_string(),
                    seller: DEMO_SELLER.to_string(),
                    price,
                    image: item.image.to_string(),
                    name: item.name.to_string(),
                    symbol: item.symbol.to_string(),
                    description: item.description.to_string(),
                    attributes: item
                        .attributes
                        .iter()
                        .map(|(trait_type, value)| Attribute {
                            trait_type: trait_type.to_string(),
                            value: value.to_string(),
                        })
                        .collect(),
                    verified: item.verified,
                    created_at: now - (i as i64 + 1) * DAY_MS,
                })
            })
            .collect()
    }
}
