/// Point ceiling per scoring category. Ceilings add up to 100 so the total
/// reads as a percentage.
pub const CATEGORY_CEILINGS: CategoryCeilings = CategoryCeilings {
    position: 25.0,
    level: 25.0,
    budget: 20.0,
    location: 15.0,
    style: 15.0,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryCeilings {
    pub position: f64,
    pub level: f64,
    pub budget: f64,
    pub location: f64,
    pub style: f64,
}

impl CategoryCeilings {
    pub fn sum(&self) -> f64 {
        self.position + self.level + self.budget + self.location + self.style
    }
}
